use std::{path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Serialize};
use url::Url;
use uvc_client::{
    NvrConfig,
    config::{DEFAULT_CAMERA_PORT, DEFAULT_NVR_PORT},
};

use crate::{Error, Result, commands::Command};

/// Environment variable holding a combined `http://host:port/?apiKey=KEY` URL.
pub const COMBINED_ENV: &str = "UVC";

pub const FACTORY_DEFAULT_PASSWORD: &str = "ubnt";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct Config {
    pub nvr: NvrConfig,
    #[serde(default)]
    pub camera: CameraDefaults,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Settings for direct camera connections; the host and username come from
/// the NVR's camera record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct CameraDefaults {
    #[serde(default = "default_camera_port")]
    pub port: u16,
    #[serde(default = "default_password")]
    pub default_password: String,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            port: DEFAULT_CAMERA_PORT,
            default_password: default_password(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

fn default_camera_port() -> u16 {
    DEFAULT_CAMERA_PORT
}

fn default_password() -> String {
    FACTORY_DEFAULT_PASSWORD.to_string()
}

#[derive(Parser, Debug)]
#[command(name = "uvc", version, about = "Remote control for UniFi Video NVRs and cameras")]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "UVC_CONFIG", value_parser = toml_from_file::<Config>)]
    pub config: Option<Config>,
    /// NVR hostname
    #[arg(short = 'H', long, env = "UVC_HOST")]
    pub host: Option<String>,
    /// NVR port
    #[arg(short = 'P', long, env = "UVC_PORT")]
    pub port: Option<u16>,
    /// NVR API key
    #[arg(short = 'K', long, env = "UVC_APIKEY")]
    pub apikey: Option<String>,
    /// Talk to the NVR over HTTPS
    #[arg(long, env = "UVC_SSL")]
    pub ssl: bool,
    /// Credential store location
    #[arg(long, env = "UVC_STORE")]
    pub store: Option<PathBuf>,
    #[arg(short, long)]
    pub verbose: bool,
    /// Camera identifier (uuid before NVR 3.2.0, id afterwards)
    #[arg(short, long)]
    pub uuid: Option<String>,
    /// Camera name, resolved to its identifier through the NVR
    #[arg(long, conflicts_with = "uuid")]
    pub name: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Merges the config file, the combined `UVC` variable and explicit
    /// options, later sources overriding earlier ones.
    pub fn get_config(&self) -> Result<Config> {
        let combined = std::env::var(COMBINED_ENV).ok();
        self.resolve_config(combined.as_deref())
    }

    pub fn resolve_config(&self, combined: Option<&str>) -> Result<Config> {
        let mut config = self.config.clone().unwrap_or_else(|| Config {
            nvr: NvrConfig::new("", DEFAULT_NVR_PORT, ""),
            camera: CameraDefaults::default(),
            store: StoreConfig::default(),
        });

        if let Some(combined) = combined {
            let parsed = parse_combined_url(combined)?;
            config.nvr.host = parsed.host;
            config.nvr.port = parsed.port;
            config.nvr.api_key = parsed.api_key;
            config.nvr.path = parsed.path;
            config.nvr.ssl = parsed.ssl;
        }

        if let Some(host) = &self.host {
            config.nvr.host = host.clone();
        }
        if let Some(port) = self.port {
            config.nvr.port = port;
        }
        if let Some(apikey) = &self.apikey {
            config.nvr.api_key = apikey.clone();
        }
        if self.ssl {
            config.nvr.ssl = true;
        }
        if let Some(store) = &self.store {
            config.store.path = Some(store.clone());
        }

        if config.nvr.host.is_empty() || config.nvr.api_key.is_empty() {
            return Err(Error::Config(
                "Host, port, and apikey are required".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Parses `http://192.168.1.1:7080/?apiKey=XXXXXXXX`. The port defaults to
/// 7080 and `https` enables TLS.
pub fn parse_combined_url(combined: &str) -> Result<NvrConfig> {
    let url = Url::parse(combined)?;

    let host = url
        .host_str()
        .ok_or_else(|| Error::Config(format!("No host in `{combined}'")))?;
    let api_key = url
        .query_pairs()
        .find(|(key, _)| key == "apiKey")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error::Config(format!("No apiKey in `{combined}'")))?;

    let mut config = NvrConfig::new(host, url.port().unwrap_or(DEFAULT_NVR_PORT), api_key);
    config.path = url.path().to_string();
    config.ssl = url.scheme() == "https";

    Ok(config)
}

pub fn toml_from_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let toml = std::fs::read_to_string(path)?;
    let config_json: serde_json::Value = toml::from_str(&toml)?;
    let config = serde_json::from_value(config_json)?;
    Ok(config)
}
