use thiserror::Error;

/// The node could not supply data the current cycle needs (reserves, block
/// number, or a zero denominator that makes a price meaningless). Aborts the
/// cycle; the next swap notification retries naturally.
#[derive(Debug, Error)]
#[error("data unavailable: {0}")]
pub struct DataUnavailable(String);

impl DataUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A router quote reverted, typically because the requested size exceeds the
/// pool's liquidity. Treated like a not-profitable outcome by the caller.
#[derive(Debug, Error)]
#[error("simulation query failed: {0}")]
pub struct SimulationError(String);

impl SimulationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// The settlement transaction could not be submitted or did not mine
/// successfully. Fatal to the cycle only; monitoring continues.
#[derive(Debug, Error)]
#[error("trade execution failed: {0}")]
pub struct ExecutionError(String);

impl ExecutionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
