use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_NVR_PORT: u16 = 7080;
pub const DEFAULT_CAMERA_PORT: u16 = 80;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct NvrConfig {
    pub host: String,
    #[serde(default = "default_nvr_port")]
    pub port: u16,
    pub api_key: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl NvrConfig {
    pub fn new(host: impl Into<String>, port: u16, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            api_key: api_key.into(),
            path: default_path(),
            ssl: false,
            verify_ssl: default_verify_ssl(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct CameraConfig {
    pub host: String,
    #[serde(default = "default_camera_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

fn default_nvr_port() -> u16 {
    DEFAULT_NVR_PORT
}

fn default_camera_port() -> u16 {
    DEFAULT_CAMERA_PORT
}

fn default_path() -> String {
    "/".to_string()
}

fn default_verify_ssl() -> bool {
    true
}
