use std::{fmt, sync::Arc};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    config::CameraConfig,
    error::{Error, Result},
    models::ServerVersion,
    transport::{HttpRequest, HttpResponse, HttpTransport, Transport},
};

const LED_SETTING: &str = "led.front.status";

/// The camera's login dialect and snapshot endpoint, which changed with the
/// 3.2.0 NVR firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraApi {
    /// Session cookie from `GET /`, form login at `/login.cgi`.
    Legacy,
    /// JSON login at `/api/1.1/login`.
    Modern,
}

impl CameraApi {
    pub fn for_version(version: ServerVersion) -> Self {
        if version.is_modern() {
            CameraApi::Modern
        } else {
            CameraApi::Legacy
        }
    }

    pub fn snapshot_path(&self) -> &'static str {
        match self {
            CameraApi::Legacy => "/snapshot.cgi",
            CameraApi::Modern => "/snap.jpeg",
        }
    }

    pub fn reboot_path(&self) -> &'static str {
        "/api/1.1/reboot"
    }

    pub fn status_path(&self) -> &'static str {
        "/api/1.1/status"
    }
}

/// Session-based client for a single camera's own HTTP API.
pub struct CameraClient {
    transport: Arc<dyn Transport>,
    api: CameraApi,
    username: String,
    password: String,
    cookie: Option<String>,
}

impl fmt::Debug for CameraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraClient")
            .field("api", &self.api)
            .field("username", &self.username)
            .field("authenticated", &self.cookie.is_some())
            .finish()
    }
}

impl CameraClient {
    pub fn new(config: CameraConfig, api: CameraApi) -> Result<Self> {
        let transport = HttpTransport::new(&config.host, config.port, false, true, config.timeout)
            .map_err(|e| Error::CameraConnect(e.to_string()))?;

        Ok(Self::with_transport(
            Arc::new(transport),
            api,
            config.username,
            config.password,
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        api: CameraApi,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api,
            username: username.into(),
            password: password.into(),
            cookie: None,
        }
    }

    pub fn api(&self) -> CameraApi {
        self.api
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookie.is_some()
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let path = request.path.clone();

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::CameraConnect(e.to_string()))?;

        debug!(%method, %path, status = response.status, reason = %response.reason, "Camera request");
        Ok(response)
    }

    /// Starts a new session, replacing any previous cookie.
    pub async fn login(&mut self) -> Result<()> {
        let cookie = match self.api {
            CameraApi::Legacy => self.login_legacy().await?,
            CameraApi::Modern => self.login_modern().await?,
        };
        self.cookie = Some(cookie);

        info!(api = ?self.api, "Logged in to camera");
        Ok(())
    }

    async fn login_legacy(&self) -> Result<String> {
        let response = self.send(HttpRequest::get("/")).await?;
        let cookie = session_cookie(&response)?;
        let session = session_id(&cookie)
            .ok_or_else(|| Error::CameraAuth("Malformed session cookie".to_string()))?;

        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("AIROS_SESSIONID", session),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        let request = HttpRequest::post("/login.cgi")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "*")
            .header("Cookie", cookie.as_str())
            .body(form);

        let response = self.send(request).await?;
        if response.status != 200 {
            return Err(Error::CameraAuth(format!("Failed to login: {}", response.reason)));
        }

        Ok(cookie)
    }

    async fn login_modern(&self) -> Result<String> {
        let body = serde_json::json!({
            "username": self.username,
            "password": self.password,
        });

        let request = HttpRequest::post("/api/1.1/login")
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(&body)?);

        let response = self.send(request).await?;
        if response.status != 200 {
            return Err(Error::CameraAuth(format!("Failed to login: {}", response.reason)));
        }

        session_cookie(&response)
    }

    fn cookie(&self) -> Result<&str> {
        self.cookie
            .as_deref()
            .ok_or_else(|| Error::CameraAuth("Not logged in".to_string()))
    }

    /// Writes one configuration value; returns whether the camera acknowledged it.
    pub async fn cfgwrite(&self, setting: &str, value: impl fmt::Display) -> Result<bool> {
        let request = HttpRequest::get(format!("/cfgwrite.cgi?{setting}={value}"))
            .header("Cookie", self.cookie()?);

        let response = self.send(request).await?;
        debug!(setting, %value, status = response.status, "Wrote camera setting");

        Ok(response.status == 200)
    }

    pub async fn set_led(&self, enabled: bool) -> Result<bool> {
        self.cfgwrite(LED_SETTING, u8::from(enabled)).await
    }

    async fn authenticated_get(&self, path: &str, action: &str) -> Result<HttpResponse> {
        let request = HttpRequest::get(path).header("Cookie", self.cookie()?);
        let response = self.send(request).await?;

        match response.status {
            200 => Ok(response),
            401 | 403 | 302 => Err(Error::CameraAuth("Not logged in".to_string())),
            status => Err(Error::CameraConnect(format!("{action} failed: {status}"))),
        }
    }

    pub async fn get_snapshot(&self) -> Result<Vec<u8>> {
        Ok(self
            .authenticated_get(self.api.snapshot_path(), "Snapshot")
            .await?
            .body)
    }

    pub async fn reboot(&self) -> Result<()> {
        self.authenticated_get(self.api.reboot_path(), "Reboot")
            .await?;
        Ok(())
    }

    pub async fn get_status(&self) -> Result<Value> {
        let response = self
            .authenticated_get(self.api.status_path(), "Status")
            .await?;
        Ok(serde_json::from_slice(&response.body)?)
    }
}

fn session_cookie(response: &HttpResponse) -> Result<String> {
    response
        .header("set-cookie")
        .map(str::to_string)
        .ok_or_else(|| Error::CameraAuth("No session cookie in response".to_string()))
}

/// The value of the first `name=value` pair in a cookie header.
fn session_id(cookie: &str) -> Option<&str> {
    let (_, rest) = cookie.split_once('=')?;
    rest.split([';', '=']).next()
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::{
        error::TransportError,
        transport::testing::{MockTransport, response, response_with_headers},
    };

    fn camera(api: CameraApi) -> (CameraClient, Arc<MockTransport>) {
        let transport = MockTransport::new();
        let client = CameraClient::with_transport(transport.clone(), api, "ubnt", "ubnt");
        (client, transport)
    }

    async fn logged_in(api: CameraApi) -> (CameraClient, Arc<MockTransport>) {
        let (mut client, transport) = camera(api);
        match api {
            CameraApi::Legacy => {
                transport.push(response_with_headers(
                    200,
                    &[("Set-Cookie", "AIROS_SESSIONID=foo; Path=/")],
                    vec![],
                ));
                transport.push(response(200, vec![]));
            }
            CameraApi::Modern => {
                transport.push(response_with_headers(
                    200,
                    &[("Set-Cookie", "authId=bar")],
                    vec![],
                ));
            }
        }
        client.login().await.expect("login");
        transport.clear_requests();
        (client, transport)
    }

    #[test]
    fn test_api_for_version() {
        assert_eq!(CameraApi::for_version(ServerVersion::new(3, 1, 5)), CameraApi::Legacy);
        assert_eq!(CameraApi::for_version(ServerVersion::new(3, 2, 0)), CameraApi::Modern);
        assert_eq!(CameraApi::Legacy.snapshot_path(), "/snapshot.cgi");
        assert_eq!(CameraApi::Modern.snapshot_path(), "/snap.jpeg");
    }

    #[test]
    fn test_session_id() {
        assert_eq!(session_id("thecookie AIROS_SESSIONID=foo; bar"), Some("foo"));
        assert_eq!(session_id("AIROS_SESSIONID=abc"), Some("abc"));
        assert_eq!(session_id("no-pairs-here"), None);
        // Only the text up to the next separator is kept.
        assert_eq!(session_id("AIROS_SESSIONID=a=b; Path=/"), Some("a"));
    }

    #[tokio::test]
    async fn test_legacy_login_without_cookie() {
        let (mut client, transport) = camera(CameraApi::Legacy);
        transport.push(response(200, vec![]));

        let err = client.login().await.expect_err("no cookie");
        assert!(matches!(err, Error::CameraAuth(ref msg) if msg.contains("No session cookie")));
        assert!(!client.is_authenticated());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_modern_login_without_cookie() {
        let (mut client, transport) = camera(CameraApi::Modern);
        transport.push(response(200, vec![]));

        let err = client.login().await.expect_err("no cookie");
        assert!(matches!(err, Error::CameraAuth(ref msg) if msg.contains("No session cookie")));
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_legacy_login() {
        let (mut client, transport) = camera(CameraApi::Legacy);
        let cookie = "thecookie AIROS_SESSIONID=foo; bar";
        transport.push(response_with_headers(200, &[("set-cookie", cookie)], vec![]));
        transport.push(response(200, vec![]));

        client.login().await.expect("login");
        assert!(client.is_authenticated());

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "/");

        let login = &requests[1];
        assert_eq!(login.method, Method::POST);
        assert_eq!(login.path, "/login.cgi");
        assert_eq!(login.header_value("Cookie"), Some(cookie));
        assert_eq!(
            login.header_value("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );

        let form = String::from_utf8(login.body.clone().expect("form body")).expect("utf8");
        let mut fields: Vec<_> = form.split('&').collect();
        fields.sort();
        assert_eq!(
            fields,
            vec!["AIROS_SESSIONID=foo", "password=ubnt", "username=ubnt"]
        );
    }

    #[tokio::test]
    async fn test_legacy_login_rejected() {
        let (mut client, transport) = camera(CameraApi::Legacy);
        transport.push(response_with_headers(
            200,
            &[("Set-Cookie", "AIROS_SESSIONID=foo")],
            vec![],
        ));
        transport.push(HttpResponse {
            reason: "Forbidden".to_string(),
            ..response(403, vec![])
        });

        let err = client.login().await.expect_err("rejected");
        assert!(matches!(err, Error::CameraAuth(ref msg) if msg.contains("Forbidden")));
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_modern_login() {
        let (mut client, transport) = camera(CameraApi::Modern);
        transport.push(response_with_headers(200, &[("SET-COOKIE", "authId=bar")], vec![]));

        client.login().await.expect("login");

        let request = transport.last_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/1.1/login");
        let body: Value =
            serde_json::from_slice(request.body.as_deref().expect("body")).expect("json");
        assert_eq!(body, json!({"username": "ubnt", "password": "ubnt"}));

        transport.push(response(200, b"jpeg".to_vec()));
        client.get_snapshot().await.expect("snapshot");
        let request = transport.last_request();
        assert_eq!(request.path, "/snap.jpeg");
        assert_eq!(request.header_value("Cookie"), Some("authId=bar"));
    }

    #[tokio::test]
    async fn test_modern_login_rejected() {
        let (mut client, transport) = camera(CameraApi::Modern);
        transport.push(response(401, vec![]));

        assert!(matches!(client.login().await, Err(Error::CameraAuth(_))));
    }

    #[tokio::test]
    async fn test_set_led() {
        let (client, transport) = logged_in(CameraApi::Legacy).await;

        transport.push(response(200, vec![]));
        assert!(client.set_led(true).await.expect("led"));
        let request = transport.last_request();
        assert_eq!(request.path, "/cfgwrite.cgi?led.front.status=1");
        assert_eq!(request.header_value("Cookie"), Some("AIROS_SESSIONID=foo; Path=/"));

        transport.push(response(500, vec![]));
        assert!(!client.set_led(false).await.expect("led"));
        assert_eq!(transport.last_request().path, "/cfgwrite.cgi?led.front.status=0");
    }

    #[tokio::test]
    async fn test_operations_require_login() {
        let (client, transport) = camera(CameraApi::Modern);

        assert!(matches!(client.get_snapshot().await, Err(Error::CameraAuth(_))));
        assert!(matches!(client.set_led(true).await, Err(Error::CameraAuth(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_status_mapping() {
        let (client, transport) = logged_in(CameraApi::Legacy).await;

        transport.push(response(200, b"jpeg".to_vec()));
        assert_eq!(client.get_snapshot().await.expect("snapshot"), b"jpeg".to_vec());
        assert_eq!(transport.last_request().path, "/snapshot.cgi");

        for status in [401, 403, 302] {
            transport.push(response(status, vec![]));
            assert!(matches!(client.get_snapshot().await, Err(Error::CameraAuth(_))));
        }

        transport.push(response(500, vec![]));
        assert!(matches!(client.get_snapshot().await, Err(Error::CameraConnect(_))));

        transport.push_error(TransportError::Connection("no route to host".to_string()));
        assert!(matches!(client.get_snapshot().await, Err(Error::CameraConnect(_))));
    }

    #[tokio::test]
    async fn test_reboot() {
        let (client, transport) = logged_in(CameraApi::Modern).await;

        transport.push(response(200, vec![]));
        client.reboot().await.expect("reboot");
        assert_eq!(transport.last_request().path, "/api/1.1/reboot");

        transport.push(response(403, vec![]));
        assert!(matches!(client.reboot().await, Err(Error::CameraAuth(_))));
    }

    #[tokio::test]
    async fn test_get_status() {
        let (client, transport) = logged_in(CameraApi::Modern).await;

        transport.push(response(200, br#"{"uptime": 42}"#.to_vec()));
        let status = client.get_status().await.expect("status");
        assert_eq!(status, json!({"uptime": 42}));
        assert_eq!(transport.last_request().path, "/api/1.1/status");

        transport.push_error(TransportError::Protocol("truncated".to_string()));
        assert!(matches!(client.get_status().await, Err(Error::CameraConnect(_))));
    }
}
