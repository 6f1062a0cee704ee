use tracing::warn;

use crate::{
    Error, Result,
    camera::CameraClient,
    nvr::NvrClient,
};

/// Fetches a snapshot straight from the camera, falling back once to the
/// NVR's proxied snapshot when the camera refuses the login or cannot be
/// reached. Any other failure is returned as is.
pub async fn fetch_snapshot(
    nvr: &NvrClient,
    camera: &mut CameraClient,
    camera_id: &str,
) -> Result<Vec<u8>> {
    let direct = match camera.login().await {
        Ok(()) => camera.get_snapshot().await,
        Err(err) => Err(err),
    };

    match direct {
        Err(err @ (Error::CameraAuth(_) | Error::CameraConnect(_))) => {
            warn!(camera_id, err = %err, "Direct snapshot failed, falling back to NVR");
            nvr.get_snapshot(camera_id).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        camera::CameraApi,
        error::TransportError,
        transport::testing::{MockTransport, response, response_with_headers},
    };

    async fn nvr() -> (NvrClient, Arc<MockTransport>) {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"data": [{"systemInfo": {"version": "3.2.0"}}]}));
        let client = NvrClient::with_transport(transport.clone(), "key", "/")
            .await
            .expect("bootstrap");
        transport.clear_requests();
        (client, transport)
    }

    fn camera() -> (CameraClient, Arc<MockTransport>) {
        let transport = MockTransport::new();
        let client =
            CameraClient::with_transport(transport.clone(), CameraApi::Modern, "ubnt", "ubnt");
        (client, transport)
    }

    #[tokio::test]
    async fn test_direct_snapshot() {
        let (nvr, nvr_transport) = nvr().await;
        let (mut camera, camera_transport) = camera();
        camera_transport.push(response_with_headers(200, &[("Set-Cookie", "authId=x")], vec![]));
        camera_transport.push(response(200, b"direct".to_vec()));

        let image = fetch_snapshot(&nvr, &mut camera, "c1").await.expect("snapshot");

        assert_eq!(image, b"direct".to_vec());
        assert!(nvr_transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_on_auth_failure() {
        let (nvr, nvr_transport) = nvr().await;
        let (mut camera, camera_transport) = camera();
        camera_transport.push(response(401, vec![]));
        nvr_transport.push(response(200, b"proxied".to_vec()));

        let image = fetch_snapshot(&nvr, &mut camera, "c1").await.expect("snapshot");

        assert_eq!(image, b"proxied".to_vec());
        assert_eq!(nvr_transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_on_connect_failure() {
        let (nvr, nvr_transport) = nvr().await;
        let (mut camera, camera_transport) = camera();
        camera_transport.push_error(TransportError::Connection("timed out".to_string()));
        nvr_transport.push(response(200, b"proxied".to_vec()));

        let image = fetch_snapshot(&nvr, &mut camera, "c1").await.expect("snapshot");
        assert_eq!(image, b"proxied".to_vec());
    }

    #[tokio::test]
    async fn test_fallback_is_single_attempt() {
        let (nvr, nvr_transport) = nvr().await;
        let (mut camera, camera_transport) = camera();
        camera_transport.push(response_with_headers(200, &[("Set-Cookie", "authId=x")], vec![]));
        camera_transport.push(response(500, vec![]));
        nvr_transport.push(response(503, vec![]));

        let result = fetch_snapshot(&nvr, &mut camera, "c1").await;

        assert!(matches!(result, Err(Error::NvrStatus(503))));
        assert_eq!(nvr_transport.requests().len(), 1);
        assert_eq!(camera_transport.requests().len(), 2);
    }
}
