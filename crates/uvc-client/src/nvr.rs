use std::{io::Read, sync::Arc};

use flate2::read::{GzDecoder, ZlibDecoder};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    config::NvrConfig,
    error::{Error, Result},
    models::{
        Bootstrap, BootstrapRawResponse, CameraIdentifier, CameraListResponse, CameraRecord,
        RecordMode, RecordingChannel, RecordingSettings, ServerVersion,
    },
    settings,
    transport::{HttpRequest, HttpResponse, HttpTransport, Transport},
};

const ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const ACCEPT_ENCODING: &str = "gzip, deflate, sdch";

/// Remote control for a UniFi Video NVR, authenticated by API key.
pub struct NvrClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    bootstrap: Bootstrap,
    server_version: ServerVersion,
}

impl NvrClient {
    pub async fn new(config: NvrConfig) -> Result<Self> {
        check_path(&config.path)?;

        let transport = HttpTransport::new(
            &config.host,
            config.port,
            config.ssl,
            config.verify_ssl,
            config.timeout,
        )
        .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        Self::with_transport(Arc::new(transport), config.api_key, &config.path).await
    }

    /// Builds a client over an existing transport. Fails unless the bootstrap
    /// request succeeds.
    pub async fn with_transport(
        transport: Arc<dyn Transport>,
        api_key: impl Into<String>,
        path: &str,
    ) -> Result<Self> {
        check_path(path)?;

        let api_key = api_key.into();
        let response = request(
            transport.as_ref(),
            &api_key,
            Method::GET,
            "/api/2.0/bootstrap",
            None,
        )
        .await?;
        let raw: BootstrapRawResponse = serde_json::from_value(response)?;
        let bootstrap = raw
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("Empty bootstrap response".to_string()))?;
        let server_version: ServerVersion = bootstrap.system_info.version.parse()?;

        debug!(version = %server_version, "Server version detected");

        Ok(Self {
            transport,
            api_key,
            bootstrap,
            server_version,
        })
    }

    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    pub fn server_version(&self) -> ServerVersion {
        self.server_version
    }

    pub fn camera_identifier(&self) -> CameraIdentifier {
        CameraIdentifier::for_version(self.server_version)
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        request(self.transport.as_ref(), &self.api_key, method, path, body).await
    }

    /// The raw camera-detail response, `data` wrapper included.
    pub async fn dump(&self, id: &str) -> Result<Value> {
        self.request(Method::GET, &camera_path(id), None).await
    }

    pub async fn get_camera(&self, id: &str) -> Result<Value> {
        first_datum(self.dump(id).await?)
    }

    async fn put_camera(&self, id: &str, detail: &Value) -> Result<Value> {
        first_datum(
            self.request(Method::PUT, &camera_path(id), Some(detail))
                .await?,
        )
    }

    pub async fn list_cameras(&self) -> Result<Vec<CameraRecord>> {
        let response: CameraListResponse =
            serde_json::from_value(self.request(Method::GET, "/api/2.0/camera", None).await?)?;

        Ok(response
            .data
            .into_iter()
            .filter(|camera| !camera.deleted)
            .map(CameraRecord::from)
            .collect())
    }

    /// The identifier of the first camera called `name`, keyed by the active
    /// identifier scheme.
    pub async fn resolve_name_to_identifier(&self, name: &str) -> Result<Option<String>> {
        let scheme = self.camera_identifier();

        Ok(self
            .list_cameras()
            .await?
            .into_iter()
            .find(|camera| camera.name == name)
            .map(|camera| camera.identifier(scheme).to_string()))
    }

    /// Returns whether the NVR echoed back the recording settings as written.
    pub async fn set_record_mode(&self, id: &str, mode: &str, channel: Option<&str>) -> Result<bool> {
        let mode: RecordMode = mode.parse()?;
        let channel = channel.map(str::parse::<RecordingChannel>).transpose()?;

        let mut detail = self.get_camera(id).await?;
        let recording = object_field_mut(&mut detail, "recordingSettings")?;

        let (full_time, motion) = mode.flags();
        recording.insert("fullTimeRecordEnabled".to_string(), Value::Bool(full_time));
        recording.insert("motionRecordEnabled".to_string(), Value::Bool(motion));
        if let Some(channel) = channel {
            recording.insert("channel".to_string(), Value::from(channel.index()));
        }
        let requested = Value::Object(recording.clone());

        let updated = self.put_camera(id, &detail).await?;
        let applied = updated.get("recordingSettings") == Some(&requested);

        debug!(id, %mode, applied, "Updated recording mode");
        Ok(applied)
    }

    pub async fn get_record_mode(&self, id: &str) -> Result<RecordMode> {
        let detail = self.get_camera(id).await?;
        let recording = detail
            .get("recordingSettings")
            .ok_or_else(|| missing_field("recordingSettings"))?;

        Ok(RecordingSettings::from_value(recording)?.mode())
    }

    pub async fn get_picture_settings(&self, id: &str) -> Result<Map<String, Value>> {
        let mut detail = self.get_camera(id).await?;
        Ok(object_field_mut(&mut detail, "ispSettings")?.clone())
    }

    /// Writes `requested` into the camera's `ispSettings`, each value coerced to
    /// the type currently stored for its key, and returns the settings the NVR
    /// reports afterwards. Keys the NVR silently ignores are not detected here;
    /// see [`settings::rejected_settings`].
    pub async fn set_picture_settings(
        &self,
        id: &str,
        requested: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let mut detail = self.get_camera(id).await?;
        settings::apply(object_field_mut(&mut detail, "ispSettings")?, requested)?;

        let mut updated = self.put_camera(id, &detail).await?;
        Ok(object_field_mut(&mut updated, "ispSettings")?.clone())
    }

    /// Drops every motion zone but the first.
    pub async fn prune_motion_zones(&self, id: &str) -> Result<()> {
        let mut detail = self.get_camera(id).await?;
        zones_mut(&mut detail)?.truncate(1);

        self.put_camera(id, &detail).await?;
        Ok(())
    }

    pub async fn list_motion_zones(&self, id: &str) -> Result<Vec<Value>> {
        let mut detail = self.get_camera(id).await?;
        Ok(std::mem::take(zones_mut(&mut detail)?))
    }

    /// A freshly captured snapshot proxied by the NVR.
    pub async fn get_snapshot(&self, id: &str) -> Result<Vec<u8>> {
        let path = format!(
            "/api/2.0/snapshot/camera/{id}?force=true&apiKey={}",
            self.api_key
        );

        let response = self
            .transport
            .send(HttpRequest::get(path))
            .await
            .map_err(|e| Error::Nvr(format!("Failed to contact NVR: {e}")))?;

        debug!(id, status = response.status, "Fetched NVR snapshot");

        if response.status != 200 {
            return Err(Error::NvrStatus(response.status));
        }

        Ok(response.body)
    }
}

fn check_path(path: &str) -> Result<()> {
    if path != "/" {
        return Err(Error::InvalidConfiguration(format!(
            "Path `{path}' not supported yet"
        )));
    }
    Ok(())
}

fn camera_path(id: &str) -> String {
    format!("/api/2.0/camera/{id}")
}

fn with_api_key(path: &str, api_key: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}apiKey={api_key}")
}

async fn request(
    transport: &dyn Transport,
    api_key: &str,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<Value> {
    let url = with_api_key(path, api_key);

    let mut request = HttpRequest::new(method.clone(), url.as_str())
        .header("Content-Type", "application/json")
        .header("Accept", ACCEPT)
        .header("Accept-Encoding", ACCEPT_ENCODING);
    if let Some(body) = body {
        request = request.body(serde_json::to_vec(body)?);
    }

    debug!(%method, path, "NVR request");

    let response = transport
        .send(request)
        .await
        .map_err(|e| Error::Nvr(format!("Failed to contact NVR: {e}")))?;

    debug!(%method, path, status = response.status, reason = %response.reason, "NVR response");

    if matches!(response.status, 401 | 403) {
        return Err(Error::NotAuthorized);
    }
    if !response.is_success() {
        return Err(Error::NvrStatus(response.status));
    }

    Ok(serde_json::from_slice(&decoded_body(response)?)?)
}

/// The response body, inflated when the NVR flagged it as gzip. Both gzip and
/// bare zlib streams are accepted under that header.
fn decoded_body(response: HttpResponse) -> Result<Vec<u8>> {
    let gzipped = response
        .header("content-encoding")
        .is_some_and(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"));
    if !gzipped {
        return Ok(response.body);
    }

    let mut inflated = Vec::new();
    let result = if response.body.starts_with(&[0x1f, 0x8b]) {
        GzDecoder::new(response.body.as_slice()).read_to_end(&mut inflated)
    } else {
        ZlibDecoder::new(response.body.as_slice()).read_to_end(&mut inflated)
    };
    result.map_err(|e| Error::Nvr(format!("Failed to decompress response: {e}")))?;

    Ok(inflated)
}

fn first_datum(mut response: Value) -> Result<Value> {
    response
        .get_mut("data")
        .and_then(Value::as_array_mut)
        .filter(|data| !data.is_empty())
        .map(|data| data.swap_remove(0))
        .ok_or_else(|| missing_field("data"))
}

fn missing_field(field: &str) -> Error {
    Error::UnexpectedResponse(format!("Missing `{field}' in camera detail"))
}

fn object_field_mut<'a>(detail: &'a mut Value, field: &str) -> Result<&'a mut Map<String, Value>> {
    detail
        .get_mut(field)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| missing_field(field))
}

fn zones_mut(detail: &mut Value) -> Result<&mut Vec<Value>> {
    detail
        .get_mut("zones")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| missing_field("zones"))
}
