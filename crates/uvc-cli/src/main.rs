use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use uvc_cli::{Result, commands, config::Args, context::Context, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            error!(err = ?err, "Command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    logging::init_logging(args.verbose)?;

    let config = args
        .get_config()
        .inspect_err(|err| error!(err = ?err, "Error getting config"))?;
    debug!(
        host = %config.nvr.host,
        port = config.nvr.port,
        ssl = config.nvr.ssl,
        "Parsed config successfully"
    );

    let mut context = Context::new(config).await?;
    commands::run(&mut context, &args).await
}
