use tracing::debug;
use uvc_client::{CameraApi, CameraClient, CameraConfig, NvrClient};
use uvc_store::InfoStore;

use crate::{Result, config::{CameraDefaults, Config}};

pub struct Context {
    pub nvr: NvrClient,
    pub store: InfoStore,
    pub camera_defaults: CameraDefaults,
}

impl Context {
    pub async fn new(config: Config) -> Result<Self> {
        let nvr = NvrClient::new(config.nvr).await?;
        debug!(version = %nvr.server_version(), "Connected to NVR");

        let store = InfoStore::open(config.store.path).await?;

        Ok(Self {
            nvr,
            store,
            camera_defaults: config.camera,
        })
    }

    pub fn camera_api(&self) -> CameraApi {
        CameraApi::for_version(self.nvr.server_version())
    }

    /// A client for talking to a camera directly, using its NVR record for the
    /// address and login name and the credential store for the password.
    pub fn camera_client(&self, camera_id: &str, detail: &serde_json::Value) -> Result<CameraClient> {
        let host = detail
            .get("host")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput(format!("Camera {camera_id} has no host")))?;
        let username = detail
            .get("username")
            .and_then(|v| v.as_str())
            .unwrap_or("ubnt");
        let password = self
            .store
            .get_password(camera_id)
            .unwrap_or(self.camera_defaults.default_password.as_str());

        let config = CameraConfig {
            host: host.to_string(),
            port: self.camera_defaults.port,
            username: username.to_string(),
            password: password.to_string(),
            timeout: self.camera_defaults.timeout,
        };

        Ok(CameraClient::new(config, self.camera_api())?)
    }
}
