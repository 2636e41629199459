//! User-level scenarios over a scripted transport.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use serde_json::json;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use storefront_client::mocks::MockTransport;
use storefront_client::transport::{TransportRequest, TransportResult};
use storefront_client::{
    ActionError, AuthResponse, Capability, CreateOrderRequest, Dispatcher, KeyGenerator,
    LoginRequest, Outcome, RequestDescriptor, Session, Storefront, Transport,
    IDEMPOTENCY_KEY_HEADER,
};
use tokio::sync::oneshot;

/// Holds the first response back until the gate is opened
struct GatedTransport {
    inner: MockTransport,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedTransport {
    fn new(inner: MockTransport) -> (Self, oneshot::Sender<()>) {
        let (open, gate) = oneshot::channel();
        let transport = Self {
            inner,
            gate: Mutex::new(Some(gate)),
        };
        (transport, open)
    }
}

impl Transport for GatedTransport {
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportResult> + Send {
        let gate = self.gate.lock().unwrap().take();
        let response = self.inner.send(request);

        async move {
            let response = response.await;
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            response
        }
    }
}

#[tokio::test]
async fn login_success_is_applied_by_the_caller() {
    let transport = MockTransport::new();
    transport.push_json(200, json!({"accessToken": "tok1", "role": "ADMIN", "email": "a@b.com"}));
    let session = Session::new();
    let dispatcher = Dispatcher::new(transport.clone(), "http://shop.test", session.clone());

    let descriptor = RequestDescriptor::post("/api/v1/auth/login")
        .with_json_body(json!({"email": "a@b.com", "password": "x"}));
    let outcome = dispatcher.dispatch(&descriptor).await;

    let Outcome::Success { payload } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(payload["accessToken"], "tok1");
    assert!(!session.is_authenticated());

    let auth: AuthResponse = serde_json::from_value(payload).unwrap();
    session.set_identity(&auth.access_token, auth.role.as_deref(), Some(auth.email.as_str()));

    assert!(session.is_authenticated());
    assert!(session.has_capability(Capability::AdminOnly));
    assert_eq!(session.current_authorization_header_value().as_deref(), Some("Bearer tok1"));
    assert_eq!(
        transport.requests()[0].body.as_deref(),
        Some(r#"{"email":"a@b.com","password":"x"}"#)
    );
}

#[tokio::test]
async fn signed_out_stock_adjust_never_reaches_the_network() {
    let transport = MockTransport::new();
    let storefront = Storefront::new(transport.clone(), "http://shop.test");

    assert!(!storefront.session().is_authenticated());
    let result = storefront.adjust_stock(7, 3).await;

    assert!(matches!(result, Err(ActionError::AuthenticationRequired)));
    assert_eq!(
        result.unwrap_err().to_string(),
        storefront_client::error::AUTHENTICATION_REQUIRED_ADVISORY
    );
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn consecutive_orders_use_distinct_keys() {
    let transport = MockTransport::new();
    let order = json!({"id": 1, "status": "CREATED", "totalAmount": 10.0});
    transport.push_json(201, order.clone());
    transport.push_json(201, order);

    let storefront = Storefront::new(transport.clone(), "http://shop.test");
    storefront.session().set_identity("tok1", None, Some("a@b.com"));

    let request = CreateOrderRequest::single(1, 2);
    storefront.create_order(&request, None).await.unwrap();
    storefront.create_order(&request, None).await.unwrap();

    let keys: Vec<_> = transport
        .requests()
        .iter()
        .map(|request| request.header(IDEMPOTENCY_KEY_HEADER).unwrap().to_string())
        .collect();
    assert_eq!(keys.len(), 2);
    assert_ne!(keys[0], keys[1]);
}

#[tokio::test]
async fn only_order_creation_carries_an_idempotency_key() {
    let transport = MockTransport::new();
    transport.push_json(200, json!({"orders": []}));
    transport.push_json(200, json!({"id": 1, "sku": "S", "name": "N", "price": 1.0, "quantity": 4}));

    let storefront = Storefront::new(transport.clone(), "http://shop.test");
    storefront.session().set_identity("tok1", Some("ADMIN"), None);

    storefront.list_orders().await.unwrap();
    storefront.adjust_stock(1, 1).await.unwrap();

    assert!(
        transport
            .requests()
            .iter()
            .all(|request| request.header(IDEMPOTENCY_KEY_HEADER).is_none())
    );
}

#[tokio::test]
async fn concurrent_dispatches_each_resolve_once() {
    let transport = MockTransport::new();
    transport.push_json(200, json!({"items": []}));
    transport.push_json(400, json!({"message": "Insufficient stock"}));

    let session = Session::new();
    session.set_identity("tok1", Some("ADMIN"), None);
    let dispatcher = Dispatcher::new(transport.clone(), "http://shop.test", session);

    let list = RequestDescriptor::get("/api/v1/products");
    let adjust = RequestDescriptor::post("/api/v1/admin/products/1/stock-adjust")
        .with_json_body(json!({"quantityDelta": -100}));
    let (first, second) = tokio::join!(dispatcher.dispatch(&list), dispatcher.dispatch(&adjust));

    let successes = [&first, &second].iter().filter(|o| o.is_success()).count();
    assert_eq!(successes, 1);
    assert_eq!(transport.request_count(), 2);
    assert!(
        transport
            .requests()
            .iter()
            .all(|request| request.header("Authorization") == Some("Bearer tok1"))
    );
}

#[tokio::test]
async fn late_unauthorized_response_keeps_newer_login() {
    let mock = MockTransport::new();
    mock.push_json(401, json!({"message": "Token expired"}));
    mock.push_json(200, json!({"accessToken": "fresh", "role": "ADMIN", "email": "a@b.com"}));

    let (transport, open) = GatedTransport::new(mock.clone());
    let storefront = Storefront::new(transport, "http://shop.test");
    storefront.session().set_identity("stale", Some("ADMIN"), Some("a@b.com"));

    let relogin = async {
        storefront
            .login(&LoginRequest::new("a@b.com", "pw"))
            .await
            .unwrap();
        assert_eq!(storefront.session().token().as_deref(), Some("fresh"));
        open.send(()).unwrap();
    };
    let (orders, ()) = tokio::join!(storefront.list_orders(), relogin);

    let failure = orders.as_ref().err().and_then(ActionError::failure).unwrap();
    assert!(failure.is_unauthorized());
    assert_eq!(
        mock.requests()[0].header("Authorization"),
        Some("Bearer stale")
    );
    assert_eq!(
        storefront.session().current_authorization_header_value().as_deref(),
        Some("Bearer fresh")
    );
}

#[test]
fn ten_thousand_keys_are_distinct() {
    let generator = KeyGenerator::new();
    let keys: HashSet<_> = (0..10_000).map(|_| generator.generate()).collect();
    assert_eq!(keys.len(), 10_000);
}
