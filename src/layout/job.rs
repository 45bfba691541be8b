//! Layout runs on a worker thread, reported back over a channel.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use super::{compute_layout_cancellable, CancelToken, LayoutAlgorithm, LayoutConfig, LayoutEdge, LayoutNode, LayoutResult};

/// Result of a background run together with the data generation it was computed for.
#[derive(Debug)]
pub struct LayoutOutcome {
    pub generation: u64,
    pub result: LayoutResult,
}

#[derive(Debug)]
pub struct LayoutJob {
    generation: u64,
    cancel: CancelToken,
    rx: Receiver<LayoutOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutJob {
    pub fn spawn(
        generation: u64,
        nodes: Vec<LayoutNode>,
        edges: Vec<LayoutEdge>,
        algorithm: LayoutAlgorithm,
        config: LayoutConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name(format!("layout-{generation}"))
            .spawn(move || {
                let result = compute_layout_cancellable(&nodes, &edges, &algorithm, &config, &token);
                // The receiver is gone when the job was dropped; nothing left to report to
                let _ = tx.send(LayoutOutcome { generation, result });
            });
        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                warn!("failed to start layout worker: {}", e);
                None
            }
        };
        debug!("layout job {} started ({})", generation, if handle.is_some() { "worker" } else { "no worker" });
        Self { generation, cancel, rx, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Non-blocking poll. `Some` exactly once, when the worker has finished.
    pub fn try_result(&mut self) -> Option<LayoutOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => {
                if let Some(h) = self.handle.take() {
                    let _ = h.join();
                }
                Some(outcome)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// True once the worker can no longer deliver anything (finished and drained, or never started).
    pub fn is_dead(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Blocks until the worker reports. Used by tests and shutdown paths.
    pub fn wait(mut self) -> Option<LayoutOutcome> {
        let out = self.rx.recv().ok();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
        out
    }
}

impl Drop for LayoutJob {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
