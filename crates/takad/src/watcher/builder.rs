use color_eyre::eyre;
use tokio_util::sync::CancellationToken;

use super::{Handle, Worker};
use taka_core::{config::Config, gate::ExecutionGate};

pub struct Builder {
    pub config: Config,
    pub shutdown_token: CancellationToken,
}

impl Builder {
    pub fn build(self) -> eyre::Result<Handle> {
        let Self {
            config,
            shutdown_token,
        } = self;

        let worker = Worker {
            config,
            gate: ExecutionGate::new(),
            shutdown_token: shutdown_token.clone(),
        };
        let worker_handle = tokio::spawn(worker.run());

        Ok(Handle {
            shutdown_token,
            worker_handle: Some(worker_handle),
        })
    }
}
