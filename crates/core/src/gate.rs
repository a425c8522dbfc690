use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Single-flight gate over detection cycles.
///
/// At most one cycle may hold the gate at any instant; callbacks that find it
/// taken skip their cycle entirely instead of queueing. The claim is an
/// atomic compare-and-set so concurrent swap callbacks cannot both win.
#[derive(Debug, Clone, Default)]
pub struct ExecutionGate {
    busy: Arc<AtomicBool>,
}

impl ExecutionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the gate, or returns `None` while another cycle holds it.
    /// The returned pass reopens the gate when dropped, whichever way the
    /// holding cycle ends.
    pub fn try_enter(&self) -> Option<GatePass> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| GatePass {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`ExecutionGate`] for the duration of one cycle.
#[derive(Debug)]
pub struct GatePass {
    busy: Arc<AtomicBool>,
}

impl Drop for GatePass {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
