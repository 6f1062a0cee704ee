use std::process::ExitCode;

use clap::{Subcommand, ValueEnum};

use crate::{Error, Result, config::Args, context::Context};

mod camera;
mod nvr;
mod password;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List cameras with their status and recording mode
    List,
    /// Print the NVR's full record for a camera
    Dump,
    /// Set the recording mode (none, full, motion)
    SetRecordMode {
        mode: String,
        /// Recording channel (high, medium, low)
        #[arg(long)]
        channel: Option<String>,
    },
    /// Show the recording mode; exits non-zero when recording is off
    GetRecordMode,
    /// Print picture settings as `key=value,...`
    GetPictureSettings,
    /// Apply picture settings from a `key=value,...` string
    SetPictureSettings { settings: String },
    /// Turn the front LED of a micro camera on or off
    SetLed {
        #[arg(value_enum)]
        state: LedState,
    },
    /// Write a snapshot image to stdout
    Snapshot,
    /// Reboot the camera
    Reboot,
    /// Remove all but the first motion zone
    PruneZones,
    /// List motion zone names
    ListZones,
    /// Store the camera's administrator password
    SetPassword,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    On,
    Off,
}

pub async fn run(context: &mut Context, args: &Args) -> Result<ExitCode> {
    let camera_id = match &args.name {
        Some(name) => match context.nvr.resolve_name_to_identifier(name).await? {
            Some(id) => Some(id),
            None => {
                println!("`{name}' is not a valid name");
                return Ok(ExitCode::FAILURE);
            }
        },
        None => args.uuid.clone(),
    };

    let require_id = || {
        camera_id
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("Name or UUID is required".to_string()))
    };

    match &args.command {
        Command::List => nvr::list(&context.nvr).await,
        Command::Dump => nvr::dump(&context.nvr, require_id()?).await,
        Command::SetRecordMode { mode, channel } => {
            nvr::set_record_mode(&context.nvr, require_id()?, mode, channel.as_deref()).await
        }
        Command::GetRecordMode => nvr::get_record_mode(&context.nvr, require_id()?).await,
        Command::GetPictureSettings => {
            nvr::get_picture_settings(&context.nvr, require_id()?).await
        }
        Command::SetPictureSettings { settings } => {
            nvr::set_picture_settings(&context.nvr, require_id()?, settings).await
        }
        Command::SetLed { state } => {
            camera::set_led(context, require_id()?, *state == LedState::On).await
        }
        Command::Snapshot => camera::snapshot(context, require_id()?).await,
        Command::Reboot => camera::reboot(context, require_id()?).await,
        Command::PruneZones => nvr::prune_zones(&context.nvr, require_id()?).await,
        Command::ListZones => nvr::list_zones(&context.nvr, require_id()?).await,
        Command::SetPassword => password::set_password(&mut context.store, require_id()?).await,
    }
}
