use std::process::ExitCode;

use color_eyre::eyre::{self, eyre};
use taka_core::config::Config;
use takad::{
    Taka,
    telemetry::{self, init_subscriber},
};
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
};
use tracing::{error, info, instrument, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // set up config
    let cfg: Config = match Config::load() {
        Err(err) => {
            eprintln!("failed to read config:\n{err:?}");
            return ExitCode::FAILURE;
        }
        Ok(cfg) => cfg,
    };
    eprintln!("starting with config:\n{cfg:?}");

    // set up tracing
    let tracing_subscriber = telemetry::get_subscriber();
    init_subscriber(tracing_subscriber);

    // spawn service
    let mut taka = match Taka::spawn(cfg) {
        Ok(taka) => taka,
        Err(e) => {
            error!(%e, "failed initializing taka");
            return ExitCode::FAILURE;
        }
    };

    let mut sigterm = signal(SignalKind::terminate())
        .expect("setting sigterm listener on unix should always work");

    let exit_reason = select! {
        _ = sigterm.recv() => Ok("received SIGTERM"),
        res = &mut taka => {
            res.and_then(|()| Err(eyre!("taka service exited")))
        },
    };

    shutdown(exit_reason, taka).await
}

#[instrument(skip_all)]
async fn shutdown(reason: eyre::Result<&str>, service: Taka) -> ExitCode {
    let exit_code = match reason {
        Ok(reason) => {
            info!(reason, "shutting down");
            if let Err(e) = service.shutdown().await {
                warn!(%e, "shutting down");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%e, "taka service exited unexpectedly");
            ExitCode::FAILURE
        }
    };
    info!("shutdown successful");
    exit_code
}
