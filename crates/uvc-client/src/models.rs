use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// First NVR release with the `id`-keyed camera API and the v3.2 camera login.
pub const MODERN_API_VERSION: ServerVersion = ServerVersion::new(3, 2, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    pub fn is_modern(&self) -> bool {
        *self >= MODERN_API_VERSION
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    /// Non-numeric revisions (`3.4.beta5`) and missing ones parse as 0.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('.');

        let mut component = |name: &str| {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| Error::UnexpectedResponse(format!("Invalid {name} in version `{s}'")))
        };

        let major = component("major")?;
        let minor = component("minor")?;
        let revision = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(0);

        Ok(Self::new(major, minor, revision))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// Which field the NVR uses to key cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraIdentifier {
    Uuid,
    Id,
}

impl CameraIdentifier {
    pub fn for_version(version: ServerVersion) -> Self {
        if version.is_modern() {
            CameraIdentifier::Id
        } else {
            CameraIdentifier::Uuid
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            CameraIdentifier::Uuid => "uuid",
            CameraIdentifier::Id => "id",
        }
    }
}

impl fmt::Display for CameraIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BootstrapRawResponse {
    pub data: Vec<Bootstrap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    pub system_info: SystemInfo,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CameraListResponse {
    pub data: Vec<RawCamera>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCamera {
    pub name: String,
    pub uuid: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// A camera as listed by the NVR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub name: String,
    pub uuid: String,
    pub id: String,
    pub state: String,
    pub managed: bool,
}

impl CameraRecord {
    pub fn identifier(&self, scheme: CameraIdentifier) -> &str {
        match scheme {
            CameraIdentifier::Uuid => &self.uuid,
            CameraIdentifier::Id => &self.id,
        }
    }
}

impl From<RawCamera> for CameraRecord {
    fn from(value: RawCamera) -> Self {
        Self {
            name: value.name,
            uuid: value.uuid,
            id: value.id,
            state: value.state,
            managed: value.managed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    None,
    Full,
    Motion,
}

impl RecordMode {
    /// Full-time wins over motion when the NVR reports both.
    pub fn from_flags(full_time: bool, motion: bool) -> Self {
        if full_time {
            RecordMode::Full
        } else if motion {
            RecordMode::Motion
        } else {
            RecordMode::None
        }
    }

    /// `(fullTimeRecordEnabled, motionRecordEnabled)` for this mode.
    pub fn flags(&self) -> (bool, bool) {
        match self {
            RecordMode::None => (false, false),
            RecordMode::Full => (true, false),
            RecordMode::Motion => (false, true),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordMode::None => "none",
            RecordMode::Full => "full",
            RecordMode::Motion => "motion",
        }
    }
}

impl FromStr for RecordMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(RecordMode::None),
            "full" => Ok(RecordMode::Full),
            "motion" => Ok(RecordMode::Motion),
            _ => Err(Error::InvalidArgument(format!("Unknown mode `{s}'"))),
        }
    }
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingChannel {
    High,
    Medium,
    Low,
}

impl RecordingChannel {
    pub const NAMES: [&'static str; 3] = ["high", "medium", "low"];

    pub fn index(&self) -> u8 {
        match self {
            RecordingChannel::High => 0,
            RecordingChannel::Medium => 1,
            RecordingChannel::Low => 2,
        }
    }
}

impl FromStr for RecordingChannel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(RecordingChannel::High),
            "medium" => Ok(RecordingChannel::Medium),
            "low" => Ok(RecordingChannel::Low),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown channel `{s}', expected one of {}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// The `recordingSettings` sub-object of a camera detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSettings {
    #[serde(default)]
    pub full_time_record_enabled: bool,
    #[serde(default)]
    pub motion_record_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

impl RecordingSettings {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn mode(&self) -> RecordMode {
        RecordMode::from_flags(self.full_time_record_enabled, self.motion_record_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_version() {
        let version: ServerVersion = "3.4.5".parse().expect("valid version");
        assert_eq!(version, ServerVersion::new(3, 4, 5));
    }

    #[test]
    fn test_parse_server_version_non_numeric_revision() {
        let version: ServerVersion = "3.4.beta5".parse().expect("valid version");
        assert_eq!(version, ServerVersion::new(3, 4, 0));
    }

    #[test]
    fn test_parse_server_version_rejects_garbage() {
        assert!("three.four.five".parse::<ServerVersion>().is_err());
        assert!("3".parse::<ServerVersion>().is_err());
    }

    #[test]
    fn test_server_version_display() {
        assert_eq!(ServerVersion::new(3, 10, 2).to_string(), "3.10.2");
    }

    #[test]
    fn test_identifier_scheme_by_version() {
        assert_eq!(
            CameraIdentifier::for_version(ServerVersion::new(3, 1, 0)).field_name(),
            "uuid"
        );
        assert_eq!(
            CameraIdentifier::for_version(ServerVersion::new(3, 1, 99)).field_name(),
            "uuid"
        );
        for version in [
            ServerVersion::new(3, 2, 0),
            ServerVersion::new(3, 2, 1),
            ServerVersion::new(3, 10, 0),
            ServerVersion::new(4, 0, 0),
        ] {
            assert_eq!(CameraIdentifier::for_version(version), CameraIdentifier::Id);
        }
    }

    #[test]
    fn test_record_mode_parse_is_case_insensitive() {
        assert_eq!("FULL".parse::<RecordMode>().expect("valid"), RecordMode::Full);
        assert_eq!("Motion".parse::<RecordMode>().expect("valid"), RecordMode::Motion);
        assert!(matches!(
            "always".parse::<RecordMode>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_record_mode_precedence() {
        assert_eq!(RecordMode::from_flags(true, true), RecordMode::Full);
        assert_eq!(RecordMode::from_flags(false, true), RecordMode::Motion);
        assert_eq!(RecordMode::from_flags(false, false), RecordMode::None);
    }

    #[test]
    fn test_channel_index() {
        assert_eq!("medium".parse::<RecordingChannel>().expect("valid").index(), 1);
        assert!(matches!(
            "ultra".parse::<RecordingChannel>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deserialize_camera_list() {
        let data = r#"{
            "data": [
                {"name": "Front", "uuid": "u1", "_id": "i1", "state": "CONNECTED", "managed": true, "deleted": false},
                {"name": "Gone", "uuid": "u2", "_id": "i2", "state": "DISCONNECTED", "managed": true, "deleted": true}
            ]
        }"#;

        let list: CameraListResponse = serde_json::from_str(data).expect("valid list");
        let record = CameraRecord::from(list.data[0].clone());
        assert_eq!(record.identifier(CameraIdentifier::Uuid), "u1");
        assert_eq!(record.identifier(CameraIdentifier::Id), "i1");
        assert!(list.data[1].deleted);
    }
}
