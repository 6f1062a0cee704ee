use std::process::ExitCode;

use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use uvc_client::{Error as ClientError, fetch_snapshot};

use crate::{Result, context::Context};

pub async fn set_led(context: &Context, id: &str, enabled: bool) -> Result<ExitCode> {
    let detail = context.nvr.get_camera(id).await?;

    let model = detail.get("model").and_then(|v| v.as_str()).unwrap_or_default();
    if !model.contains("Micro") {
        println!("Only micro cameras support LED status");
        return Ok(ExitCode::from(2));
    }

    let mut camera = context.camera_client(id, &detail)?;
    camera.login().await?;

    if camera.set_led(enabled).await? {
        info!(id, enabled, "Updated LED state");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(id, "Camera did not accept the LED setting");
        Ok(ExitCode::FAILURE)
    }
}

pub async fn snapshot(context: &Context, id: &str) -> Result<ExitCode> {
    let detail = context.nvr.get_camera(id).await?;
    let mut camera = context.camera_client(id, &detail)?;

    let image = fetch_snapshot(&context.nvr, &mut camera, id).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&image).await?;
    stdout.flush().await?;

    Ok(ExitCode::SUCCESS)
}

pub async fn reboot(context: &Context, id: &str) -> Result<ExitCode> {
    let detail = context.nvr.get_camera(id).await?;
    let mut camera = context.camera_client(id, &detail)?;

    let result = match camera.login().await {
        Ok(()) => camera.reboot().await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(ClientError::CameraAuth(_)) => {
            println!("Failed to login to camera");
            Ok(ExitCode::FAILURE)
        }
        Err(ClientError::CameraConnect(_)) => {
            println!("Failed to connect to camera");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
