use std::time::Duration;

use color_eyre::eyre::{self, Context};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::watcher;
use taka_core::config::Config;

pub(super) struct Taka {
    shutdown_token: CancellationToken,
    watcher_handle: watcher::Handle,
}

impl Taka {
    pub(super) fn new(cfg: Config, shutdown_token: CancellationToken) -> eyre::Result<Self> {
        for venue in &cfg.venues {
            info!(
                venue.name = %venue.name,
                venue.factory = %venue.factory,
                venue.router = %venue.router,
                "🏦 monitoring venue from config"
            );
        }

        let watcher_handle = watcher::Builder {
            config: cfg,
            shutdown_token: shutdown_token.child_token(),
        }
        .build()
        .wrap_err("failed to start swap watcher")?;

        Ok(Self {
            shutdown_token,
            watcher_handle,
        })
    }

    pub(super) async fn run(mut self) -> eyre::Result<()> {
        let reason: eyre::Result<&str> = {
            loop {
                select! {
                    biased;

                    () = self.shutdown_token.cancelled() => break Ok("received shutdown signal"),

                    // Handle watcher completion
                    result = &mut self.watcher_handle => {
                        match result {
                            Ok(()) => break Ok("swap watcher completed"),
                            Err(e) => break Err(e),
                        }
                    }
                }
            }
        };

        Ok(self.shutdown(reason).await)
    }

    #[instrument(skip_all)]
    async fn shutdown(mut self, reason: eyre::Result<&'static str>) {
        const WAIT_BEFORE_ABORT: Duration = Duration::from_secs(25);

        // trigger the shutdown token in case it wasn't triggered yet
        self.shutdown_token.cancel();

        let message = format!(
            "waiting {} for all subtasks to shutdown before aborting",
            humantime::format_duration(WAIT_BEFORE_ABORT)
        );
        match &reason {
            Ok(reason) => info!(%reason, message),
            Err(reason) => error!(%reason, message),
        };

        if let Err(e) = self.watcher_handle.shutdown().await {
            error!("failed to shutdown swap watcher: {}", e);
        }
    }
}
