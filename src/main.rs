use std::process::ExitCode;

use tokio::signal;
use tracing::{error, info};

use cinder::config::Config;
use cinder::server::Server;

/// Entry point: parse flags, bind, serve until the process is interrupted.
///
/// Bad flag values exit non-zero before any socket is bound; ctrl-c shuts
/// the server down cleanly with exit code 0.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = match Config::from_args(std::env::args()) {
        Ok(config) => config,
        Err(cli_error) => {
            error!(%cli_error, "invalid command line arguments");
            return ExitCode::FAILURE;
        }
    };

    let server = Server::new(config);

    tokio::select! {
        result = server.run() => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(io_error) => {
                error!(%io_error, "server terminated");
                ExitCode::FAILURE
            }
        },
        _ = signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            ExitCode::SUCCESS
        }
    }
}
