//! Event ledger HTTP router.

use crate::handlers;
use crate::ledger::EventLedger;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create the event ledger router with all endpoints.
///
/// # Routes
///
/// - `POST /events` - Book an event
/// - `GET /events` - List events
/// - `GET /events/:id` - Get event details
/// - `PUT /events/:id` - Amend an event or record a payment
/// - `DELETE /events/:id` - Delete an event
/// - `POST /events/:id/cancel` - Cancel an event
/// - `GET /health` - Health check
pub fn event_router(ledger: Arc<EventLedger>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/events", post(handlers::create_event).get(handlers::list_events))
        .route(
            "/events/:id",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route("/events/:id/cancel", post(handlers::cancel_event))
        .with_state(ledger)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::inventory::{InMemoryInventory, InventoryStore};
    use crate::reducer::EventEnvironment;
    use crate::repository::InMemoryEventRepository;
    use crate::types::{EventId, ProductId};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use petal_testing::test_clock;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn create_settle_and_cancel_over_http() {
        let inventory = Arc::new(InMemoryInventory::with_stock([("rose-red", 10)]));
        let ledger = EventLedger::new(EventEnvironment::new(
            Arc::new(test_clock()),
            Arc::clone(&inventory) as Arc<dyn InventoryStore>,
            Arc::new(InMemoryEventRepository::new()),
        ));
        let app = event_router(Arc::new(ledger));
        let roses = || inventory.available(&ProductId::new("rose-red"));

        let (status, created) = call(
            &app,
            "POST",
            "/events",
            Some(json!({
                "customer_name": "Maria Santos",
                "event_type": "Wedding",
                "products": [
                    {
                        "product_id": "rose-red",
                        "product_name": "Red Rose",
                        "quantity": 2,
                        "price_cents": 10000
                    }
                ],
                "down_payment": { "amount_cents": 5000 }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["event"]["status"], "Pending");
        assert_eq!(created["event"]["remaining_balance_cents"], 15000);
        assert_eq!(created["event"]["payments"][0]["is_downpayment"], true);
        assert_eq!(created["inventory"]["kind"], "not_attempted");
        let uri = format!("/events/{}", created["event"]["id"].as_str().unwrap());

        let zero = json!({ "new_payment": { "amount_cents": 0 } });
        let (status, rejected) = call(&app, "PUT", &uri, Some(zero)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejected["code"], "VALIDATION_ERROR");

        let (status, settled) = call(
            &app,
            "PUT",
            &uri,
            Some(json!({ "new_payment": { "amount_cents": 15000, "payment_method": "GCash" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settled["event"]["status"], "Fully Paid");
        assert_eq!(settled["event"]["remaining_balance_cents"], 0);
        assert_eq!(settled["inventory"]["kind"], "deducted");
        assert_eq!(roses(), Some(8));

        let (status, cancelled) = call(&app, "POST", &format!("{uri}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["event"]["status"], "Cancelled");
        assert_eq!(cancelled["inventory"]["kind"], "restored");
        assert_eq!(roses(), Some(10));

        let (status, listed) = call(&app, "GET", "/events", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, missing) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_event_is_404() {
        let ledger = EventLedger::new(EventEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(InMemoryInventory::new()),
            Arc::new(InMemoryEventRepository::new()),
        ));
        let app = event_router(Arc::new(ledger));

        let uri = format!("/events/{}/cancel", EventId::new());
        let (status, _) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
