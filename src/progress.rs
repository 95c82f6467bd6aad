use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Pipeline stage a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    Scan,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Render => "create chunk qr code",
            Stage::Scan => "restore",
        }
    }
}

/// Side channel for progress; never part of the data contract.
///
/// Calls may arrive from several worker threads at once.
pub trait ProgressObserver: Send + Sync {
    fn started(&self, _stage: Stage, _total: usize) {}
    fn advanced(&self, _stage: Stage, _artifact: &str) {}
    fn finished(&self, _stage: Stage) {}
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Logs progress through `tracing`, roughly every tenth of the way.
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn ProgressObserver> {
        Arc::new(Self::new())
    }
}

impl ProgressObserver for TracingProgress {
    fn started(&self, stage: Stage, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        info!("{}: 0/{}", stage.label(), total);
    }

    fn advanced(&self, stage: Stage, artifact: &str) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        let step = (total / 10).max(1);
        if done % step == 0 || done == total {
            info!("{}: {}/{} ({})", stage.label(), done, total, artifact);
        } else {
            tracing::trace!("{}: {}/{} ({})", stage.label(), done, total, artifact);
        }
    }

    fn finished(&self, stage: Stage) {
        info!("{}: done", stage.label());
    }
}
