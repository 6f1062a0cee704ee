use std::process::ExitCode;

use serde_json::Value;
use tracing::{debug, warn};
use uvc_client::{Error as ClientError, NvrClient, RecordMode, settings};

use crate::{Result, format};

pub async fn list(nvr: &NvrClient) -> Result<ExitCode> {
    let scheme = nvr.camera_identifier();

    for camera in nvr.list_cameras().await? {
        let identifier = camera.identifier(scheme);
        let mode = nvr.get_record_mode(identifier).await?;
        println!(
            "{}",
            format::camera_row(identifier, &camera.name, &format::camera_status(&camera), mode)
        );
    }

    Ok(ExitCode::SUCCESS)
}

pub async fn dump(nvr: &NvrClient, id: &str) -> Result<ExitCode> {
    let detail = nvr.dump(id).await?;
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(ExitCode::SUCCESS)
}

pub async fn set_record_mode(
    nvr: &NvrClient,
    id: &str,
    mode: &str,
    channel: Option<&str>,
) -> Result<ExitCode> {
    if nvr.set_record_mode(id, mode, channel).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(id, mode, "NVR did not apply the requested recording settings");
        Ok(ExitCode::FAILURE)
    }
}

pub async fn get_record_mode(nvr: &NvrClient, id: &str) -> Result<ExitCode> {
    let mode = nvr.get_record_mode(id).await?;
    println!("{mode}");

    Ok(match mode {
        RecordMode::None => ExitCode::FAILURE,
        RecordMode::Full | RecordMode::Motion => ExitCode::SUCCESS,
    })
}

pub async fn get_picture_settings(nvr: &NvrClient, id: &str) -> Result<ExitCode> {
    let settings = nvr.get_picture_settings(id).await?;
    println!("{}", format::picture_settings(&settings));
    Ok(ExitCode::SUCCESS)
}

pub async fn set_picture_settings(nvr: &NvrClient, id: &str, input: &str) -> Result<ExitCode> {
    let requested = format::parse_picture_settings(input)?;

    let result = match nvr.set_picture_settings(id, &requested).await {
        Ok(result) => result,
        Err(ClientError::InvalidArgument(msg)) => {
            println!("Invalid value: {msg}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };

    for key in settings::rejected_settings(&requested, &result) {
        println!("Rejected: {key}");
    }

    debug!(id, "Applied picture settings");
    Ok(ExitCode::SUCCESS)
}

pub async fn prune_zones(nvr: &NvrClient, id: &str) -> Result<ExitCode> {
    nvr.prune_motion_zones(id).await?;
    Ok(ExitCode::SUCCESS)
}

pub async fn list_zones(nvr: &NvrClient, id: &str) -> Result<ExitCode> {
    for zone in nvr.list_motion_zones(id).await? {
        match zone.get("name") {
            Some(Value::String(name)) => println!("{name}"),
            Some(name) => println!("{name}"),
            None => println!("{zone}"),
        }
    }
    Ok(ExitCode::SUCCESS)
}
