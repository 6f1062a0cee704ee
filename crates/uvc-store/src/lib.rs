use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub mod error;

use crate::error::{Error, Result};

pub const DEFAULT_FILE_NAME: &str = ".uvcclient";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub camera_passwords: BTreeMap<String, String>,
}

/// Camera passwords kept on disk, obscured with base64 but not encrypted.
#[derive(Debug)]
pub struct InfoStore {
    path: PathBuf,
    data: StoreData,
}

impl InfoStore {
    /// Opens the store at `path`, or at `~/.uvcclient` when none is given. A
    /// missing file opens as an empty store.
    pub async fn open(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => default_path()?,
        };

        let data = load(&path).await?;
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn camera_passwords(&self) -> &BTreeMap<String, String> {
        &self.data.camera_passwords
    }

    pub fn get_password(&self, camera_id: &str) -> Option<&str> {
        self.data.camera_passwords.get(camera_id).map(String::as_str)
    }

    /// Records a password and writes the store out immediately.
    pub async fn set_password(&mut self, camera_id: &str, password: &str) -> Result<()> {
        self.data
            .camera_passwords
            .insert(camera_id.to_string(), password.to_string());
        self.save().await
    }

    pub async fn save(&self) -> Result<()> {
        let encoded = BASE64_STANDARD.encode(serde_json::to_vec(&self.data)?);

        tokio::fs::write(&self.path, encoded)
            .await
            .inspect_err(|e| error!(path = %self.path.display(), "Unable to write store: {e}"))?;
        restrict_permissions(&self.path).await?;

        debug!(path = %self.path.display(), "Saved info store");
        Ok(())
    }
}

pub fn default_path() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(DEFAULT_FILE_NAME))
        .ok_or_else(|| Error::Location("HOME environment variable not set".to_string()))
}

async fn load(path: &Path) -> Result<StoreData> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No info store");
            return Ok(StoreData::default());
        }
        Err(e) => return Err(e.into()),
    };

    decode(&contents).inspect_err(|e| error!(path = %path.display(), "Failed to read store data: {e}"))
}

fn decode(contents: &str) -> Result<StoreData> {
    let json = BASE64_STANDARD.decode(contents.trim())?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
