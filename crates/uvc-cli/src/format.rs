use serde_json::{Map, Value};
use uvc_client::{CameraRecord, RecordMode};

use crate::{Error, Result};

pub fn camera_status(camera: &CameraRecord) -> String {
    if !camera.managed {
        return "new".to_string();
    }

    match camera.state.as_str() {
        "FIRMWARE_OUTDATED" => "outdated".to_string(),
        "UPGRADING" => "upgrading".to_string(),
        "DISCONNECTED" => "offline".to_string(),
        "CONNECTED" => "online".to_string(),
        state => format!("unknown:{state}"),
    }
}

pub fn camera_row(identifier: &str, name: &str, status: &str, mode: RecordMode) -> String {
    format!("{identifier}: {name:<24.24} [{status:>10}] {mode}")
}

/// Parses `brightness=50,contrast=40` into string values; the client coerces
/// them to the types the NVR stores.
pub fn parse_picture_settings(input: &str) -> Result<Map<String, Value>> {
    input
        .split(',')
        .map(|setting| {
            let mut parts = setting.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if !key.is_empty() => {
                    Ok((key.to_string(), Value::String(value.to_string())))
                }
                _ => Err(Error::InvalidInput(
                    "Invalid picture setting string format".to_string(),
                )),
            }
        })
        .collect()
}

/// Renders settings in the order the NVR reported them. Booleans print as
/// `True`/`False`.
pub fn picture_settings(settings: &Map<String, Value>) -> String {
    settings
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            Value::Bool(true) => format!("{key}=True"),
            Value::Bool(false) => format!("{key}=False"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(",")
}
