use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url, redirect::Policy};
use tracing::trace;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path plus query string, relative to the transport's base URL.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup; the first matching header wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A single HTTP round trip. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(
        host: &str,
        port: u16,
        ssl: bool,
        verify_ssl: bool,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(!verify_ssl);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        let scheme = if ssl { "https" } else { "http" };
        let base_url = Url::parse(&format!("{scheme}://{host}:{port}"))
            .map_err(|e| TransportError::Protocol(format!("Invalid URL: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| TransportError::Protocol(format!("Invalid URL: {e}")))?;

        let mut builder = self.client.request(request.method, url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        trace!(status = status.as_u16(), bytes = body.len(), "Received response");

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use super::*;

    /// Replays canned responses in order and records every request it sees.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn push(&self, response: HttpResponse) {
            self.responses
                .lock()
                .expect("mock lock")
                .push_back(Ok(response));
        }

        pub fn push_json(&self, status: u16, value: serde_json::Value) {
            self.push(response(status, value.to_string().into_bytes()));
        }

        pub fn push_error(&self, error: TransportError) {
            self.responses
                .lock()
                .expect("mock lock")
                .push_back(Err(error));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().expect("mock lock").clone()
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests()
                .pop()
                .expect("at least one request was sent")
        }

        pub fn clear_requests(&self) {
            self.requests.lock().expect("mock lock").clear();
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().expect("mock lock").push(request);
            self.responses
                .lock()
                .expect("mock lock")
                .pop_front()
                .expect("a canned response for every request")
        }
    }

    pub fn response(status: u16, body: Vec<u8>) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn response_with_headers(
        status: u16,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> HttpResponse {
        HttpResponse {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..response(status, body)
        }
    }
}
