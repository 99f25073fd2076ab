//! End-to-end bus tests over the in-process duplex path: handshake
//! authentication, scoped wire delivery, and the client-side alert
//! escalation reacting to the live stream

mod common;

use std::sync::Arc;
use std::time::Duration;

use shared::event::OrderEvent;
use shared::models::{OrderStatus, PaymentMethod, Role};
use shared::request::{LineDraft, OrderDraft};
use terminal_client::alert::{AlertEscalation, AlertSink};
use terminal_client::{MessageClient, MessageError};
use tokio::time::timeout;

use order_server::orders;

fn draft(product_id: i64) -> OrderDraft {
    OrderDraft {
        lines: vec![LineDraft::Product {
            product_id,
            quantity: 1,
            unit_price: 2100,
        }],
        delivery_address: "3 Pier Street".into(),
        payment_method: PaymentMethod::Cash,
        comment: None,
    }
}

async fn connect(
    state: &order_server::ServerState,
    id: i64,
    role: Role,
) -> MessageClient {
    let token = state
        .jwt_service
        .generate_token(id, &format!("actor-{id}"), role)
        .unwrap();
    let stream = state.bus.open_in_process(state.jwt_service());
    MessageClient::connect_duplex(stream, &token, Some(format!("till-{id}")))
        .await
        .expect("bus connect")
}

async fn recv(
    rx: &mut tokio::sync::broadcast::Receiver<OrderEvent>,
) -> OrderEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within deadline")
        .expect("client channel open")
}

#[tokio::test]
async fn connection_without_valid_token_is_refused() {
    let (state, _dir) = common::test_state().await;

    let stream = state.bus.open_in_process(state.jwt_service());
    let err = MessageClient::connect_duplex(stream, "garbage-token", None)
        .await
        .unwrap_err();
    assert!(matches!(err, MessageError::HandshakeRefused(_)));
    assert_eq!(state.bus.subscriber_count(), 0);
}

#[tokio::test]
async fn scope_is_derived_from_the_token() {
    let (state, _dir) = common::test_state().await;

    let operator = connect(&state, 1, Role::Operator).await;
    assert_eq!(operator.scope(), Some("operator"));

    let customer = connect(&state, 42, Role::Customer).await;
    assert_eq!(customer.scope(), Some("customer:42"));
}

#[tokio::test]
async fn wire_delivery_respects_scopes() {
    let (state, _dir) = common::test_state().await;
    let product_id = common::seed_product(&state, "Lamp", 2100, 5).await;

    let operator_client = connect(&state, 1, Role::Operator).await;
    let owner_client = connect(&state, 42, Role::Customer).await;
    let other_client = connect(&state, 7, Role::Customer).await;

    let mut operator_rx = operator_client.subscribe();
    let mut owner_rx = owner_client.subscribe();
    let mut other_rx = other_client.subscribe();

    let order = orders::create_order(&state, &common::customer(42), draft(product_id))
        .await
        .unwrap();
    orders::transition(&state, &common::operator(1), order.id, OrderStatus::Processing)
        .await
        .unwrap();

    assert!(matches!(
        recv(&mut operator_rx).await,
        OrderEvent::OrderCreated { .. }
    ));
    assert!(matches!(
        recv(&mut operator_rx).await,
        OrderEvent::OrderStatusChanged { status: OrderStatus::Processing, .. }
    ));

    assert!(matches!(
        recv(&mut owner_rx).await,
        OrderEvent::OrderStatusChanged { order: o, .. } if o.customer.id == 42
    ));

    // The other customer's stream stays silent
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(other_rx.try_recv().is_err());
}

struct CountingSink {
    cues: std::sync::atomic::AtomicUsize,
    quiets: std::sync::atomic::AtomicUsize,
}

impl AlertSink for CountingSink {
    fn cue(&self, _order_id: i64) {
        self.cues.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn all_quiet(&self) {
        self.quiets.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[tokio::test]
async fn alert_escalation_follows_the_live_stream() {
    let (state, _dir) = common::test_state().await;
    let product_id = common::seed_product(&state, "Lamp", 2100, 5).await;

    let operator_client = connect(&state, 1, Role::Operator).await;
    let sink = Arc::new(CountingSink {
        cues: std::sync::atomic::AtomicUsize::new(0),
        quiets: std::sync::atomic::AtomicUsize::new(0),
    });
    let alerts = Arc::new(AlertEscalation::new(
        Duration::from_millis(50),
        sink.clone(),
    ));
    tokio::spawn(terminal_client::alert::pump(
        alerts.clone(),
        operator_client.subscribe(),
    ));

    let order = orders::create_order(&state, &common::customer(42), draft(product_id))
        .await
        .unwrap();

    // The incoming order starts escalating…
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !alerts.is_pending(order.id) {
        assert!(tokio::time::Instant::now() < deadline, "alert never armed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(sink.cues.load(std::sync::atomic::Ordering::SeqCst) >= 1);

    // …and stops the moment the order is actioned
    orders::transition(&state, &common::operator(1), order.id, OrderStatus::Processing)
        .await
        .unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while alerts.is_pending(order.id) {
        assert!(tokio::time::Instant::now() < deadline, "alert never cleared");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sink.quiets.load(std::sync::atomic::Ordering::SeqCst), 1);
}
