//! Alert Escalation Controller
//!
//! Keeps the operator terminal loud about every order still awaiting
//! acknowledgment. Each order in `pending` status owns its own repeating
//! cue task, cancelable by order id; when the working set drains the sink
//! is told to go quiet. This is a pure reaction to the event stream — it
//! holds no authority over order state and never calls the server.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::event::OrderEvent;
use shared::models::OrderStatus;

/// Receiver of escalation cues (speaker, screen flash, …)
pub trait AlertSink: Send + Sync + 'static {
    /// One audible/visual repetition for an unacknowledged order
    fn cue(&self, order_id: i64);

    /// The pending set just drained; stop all cues
    fn all_quiet(&self);
}

/// Default cue repetition interval
pub const DEFAULT_CUE_INTERVAL: Duration = Duration::from_secs(5);

/// Tracks orders awaiting operator acknowledgment and repeats cues until
/// each one is actioned
pub struct AlertEscalation {
    interval: Duration,
    sink: Arc<dyn AlertSink>,
    active: Arc<DashMap<i64, CancellationToken>>,
}

impl AlertEscalation {
    pub fn new(interval: Duration, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            interval,
            sink,
            active: Arc::new(DashMap::new()),
        }
    }

    /// React to one bus event.
    ///
    /// The working set derives purely from the lifecycle status carried by
    /// the stream, never from a separate flag.
    pub fn handle_event(&self, event: &OrderEvent) {
        match event {
            OrderEvent::OrderCreated { order } => {
                if order.status == OrderStatus::Pending {
                    self.activate(order.id);
                }
            }
            OrderEvent::OrderStatusChanged { order_id, status, .. } => {
                if *status != OrderStatus::Pending {
                    self.resolve(*order_id);
                }
            }
            // A deleted order can no longer demand attention
            OrderEvent::OrderDeleted { order_id } => {
                self.resolve(*order_id);
            }
        }
    }

    /// Start a repeating cue for an order (idempotent per id)
    pub fn activate(&self, order_id: i64) {
        use dashmap::mapref::entry::Entry;

        let token = CancellationToken::new();
        match self.active.entry(order_id) {
            Entry::Occupied(_) => return,
            Entry::Vacant(vacant) => {
                vacant.insert(token.clone());
            }
        }

        let sink = self.sink.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            loop {
                sink.cue(order_id);
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });
    }

    /// Stop the cue for an order; signals all-quiet when the set drains
    pub fn resolve(&self, order_id: i64) {
        if let Some((_, token)) = self.active.remove(&order_id) {
            token.cancel();
            if self.active.is_empty() {
                self.sink.all_quiet();
            }
        }
    }

    /// Order ids currently escalating
    pub fn pending(&self) -> Vec<i64> {
        self.active.iter().map(|e| *e.key()).collect()
    }

    pub fn is_pending(&self, order_id: i64) -> bool {
        self.active.contains_key(&order_id)
    }

    /// Cancel every cue task (terminal shutdown)
    pub fn shutdown(&self) {
        for entry in self.active.iter() {
            entry.value().cancel();
        }
        self.active.clear();
    }
}

/// Drive an escalation controller from a client event subscription until
/// the channel closes
pub async fn pump(
    escalation: Arc<AlertEscalation>,
    mut events: broadcast::Receiver<OrderEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => escalation.handle_event(&event),
            // Missed events are recovered by the pull fallback; keep
            // reacting to whatever still arrives.
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Alert escalation lagged behind the event stream");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CustomerSummary, Order, PaymentMethod, PaymentStatus};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSink {
        cues: Mutex<Vec<i64>>,
        quiets: AtomicUsize,
    }

    impl MockSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                cues: Mutex::new(Vec::new()),
                quiets: AtomicUsize::new(0),
            })
        }

        fn cues_for(&self, order_id: i64) -> usize {
            self.cues
                .lock()
                .unwrap()
                .iter()
                .filter(|id| **id == order_id)
                .count()
        }
    }

    impl AlertSink for MockSink {
        fn cue(&self, order_id: i64) {
            self.cues.lock().unwrap().push(order_id);
        }

        fn all_quiet(&self) {
            self.quiets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn order(id: i64, status: OrderStatus) -> Order {
        Order {
            id,
            customer: CustomerSummary { id: 1, name: None },
            lines: vec![],
            total_amount: 100,
            delivery_address: "addr".into(),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            status,
            comment: None,
            deleted_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn created(id: i64) -> OrderEvent {
        OrderEvent::OrderCreated {
            order: order(id, OrderStatus::Pending),
        }
    }

    fn status_changed(id: i64, status: OrderStatus) -> OrderEvent {
        OrderEvent::OrderStatusChanged {
            order_id: id,
            status,
            updated_at: 1,
            order: order(id, status),
        }
    }

    #[tokio::test]
    async fn created_then_actioned_updates_pending_set() {
        let sink = MockSink::new();
        let alerts = AlertEscalation::new(Duration::from_millis(20), sink.clone());

        alerts.handle_event(&created(7));
        assert!(alerts.is_pending(7));

        alerts.handle_event(&status_changed(7, OrderStatus::Processing));
        assert!(!alerts.is_pending(7));
        assert_eq!(sink.quiets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cue_repeats_until_resolved() {
        let sink = MockSink::new();
        let alerts = AlertEscalation::new(Duration::from_millis(20), sink.clone());

        alerts.handle_event(&created(7));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(sink.cues_for(7) >= 3);

        alerts.handle_event(&status_changed(7, OrderStatus::Processing));
        tokio::time::sleep(Duration::from_millis(40)).await;
        let after_resolve = sink.cues_for(7);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(sink.cues_for(7), after_resolve);
    }

    #[tokio::test]
    async fn quiet_only_when_last_order_resolves() {
        let sink = MockSink::new();
        let alerts = AlertEscalation::new(Duration::from_millis(20), sink.clone());

        alerts.handle_event(&created(1));
        alerts.handle_event(&created(2));

        alerts.handle_event(&status_changed(1, OrderStatus::Processing));
        assert_eq!(sink.quiets.load(Ordering::SeqCst), 0);

        alerts.handle_event(&status_changed(2, OrderStatus::Cancelled));
        assert_eq!(sink.quiets.load(Ordering::SeqCst), 1);
        assert!(alerts.pending().is_empty());
    }

    #[tokio::test]
    async fn duplicate_created_events_do_not_double_cue() {
        let sink = MockSink::new();
        let alerts = AlertEscalation::new(Duration::from_millis(1000), sink.clone());

        alerts.handle_event(&created(7));
        alerts.handle_event(&created(7));
        tokio::time::sleep(Duration::from_millis(30)).await;
        // one immediate cue from the single task
        assert_eq!(sink.cues_for(7), 1);
    }

    #[tokio::test]
    async fn deleted_order_is_cleared() {
        let sink = MockSink::new();
        let alerts = AlertEscalation::new(Duration::from_millis(1000), sink.clone());

        alerts.handle_event(&created(9));
        assert!(alerts.is_pending(9));
        alerts.handle_event(&OrderEvent::OrderDeleted { order_id: 9 });
        assert!(!alerts.is_pending(9));
    }
}
