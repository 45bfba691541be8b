//! Subscribe/unsubscribe event bus with per-listener error isolation.

use std::panic::{self, AssertUnwindSafe};

use log::warn;
use serde::Serialize;

use crate::graph_utils::graph::{EdgeId, NodeId};
use crate::layout::Termination;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DataLoaded,
    LayoutComplete,
    SelectionChanged,
    TooltipRequested,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    DataLoaded { generation: u64, nodes: usize, edges: usize, skipped: usize },
    LayoutComplete { algorithm: &'static str, iterations: usize, termination: Termination },
    SelectionChanged { nodes: Vec<NodeId>, edges: Vec<EdgeId> },
    TooltipRequested { node: Option<NodeId>, edge: Option<EdgeId> },
    Error { message: String },
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::DataLoaded { .. } => EventKind::DataLoaded,
            EngineEvent::LayoutComplete { .. } => EventKind::LayoutComplete,
            EngineEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            EngineEvent::TooltipRequested { .. } => EventKind::TooltipRequested,
            EngineEvent::Error { .. } => EventKind::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&EngineEvent) -> anyhow::Result<()> + Send>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    subs: Vec<Subscription>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("subscriptions", &self.subs.len()).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subs.push(Subscription { id, kind, listener: Box::new(listener) });
        id
    }

    /// Returns false when the id was not subscribed (already removed or never issued).
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subs.len();
        self.subs.retain(|s| s.id != id);
        self.subs.len() != before
    }

    /// Delivers to every listener of the event's kind in subscription order.
    /// A listener that fails or panics is logged and skipped; the rest still run.
    /// Returns how many listeners completed successfully.
    pub fn emit(&mut self, event: &EngineEvent) -> usize {
        let kind = event.kind();
        let mut ok = 0;
        for sub in self.subs.iter_mut().filter(|s| s.kind == kind) {
            match panic::catch_unwind(AssertUnwindSafe(|| (sub.listener)(event))) {
                Ok(Ok(())) => ok += 1,
                Ok(Err(e)) => warn!("{:?} listener {:?} failed: {:#}", kind, sub.id, e),
                Err(payload) => {
                    let msg = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    warn!("{:?} listener {:?} panicked: {}", kind, sub.id, msg);
                }
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter(hits: &Arc<AtomicUsize>) -> impl FnMut(&EngineEvent) -> anyhow::Result<()> + Send + 'static {
        let hits = hits.clone();
        move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn err_event() -> EngineEvent {
        EngineEvent::Error { message: "x".into() }
    }

    #[test]
    fn only_matching_kind_is_delivered() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.on(EventKind::Error, counter(&hits));
        bus.emit(&EngineEvent::SelectionChanged { nodes: vec![], edges: vec![] });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        bus.emit(&err_event());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_stops_delivery() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = bus.on(EventKind::Error, counter(&hits));
        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&err_event());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_and_panicking_listeners_are_isolated() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.on(EventKind::Error, |_| panic!("listener blew up"));
        bus.on(EventKind::Error, |_| Err(anyhow::anyhow!("nope")));
        bus.on(EventKind::Error, counter(&hits));
        assert_eq!(bus.emit(&err_event()), 1);
        assert_eq!(bus.emit(&err_event()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
