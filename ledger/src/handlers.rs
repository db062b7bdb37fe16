//! HTTP handlers for the event ledger API.
//!
//! Amounts travel as integer centavos (`*_cents` fields) and discount rates
//! as basis points.

use crate::error::ApiError;
use crate::ledger::{EventLedger, EventOutcome, InventoryResult, NewEvent, UpdateEventRequest};
use crate::types::{
    DiscountOverride, Event, EventDetails, EventId, LineItem, Money, Payment, PaymentInput,
    Percentage, StockLine,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Line item on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineItemDto {
    /// Product identifier.
    pub product_id: String,

    /// Product name at selection time.
    pub product_name: String,

    /// Quantity.
    pub quantity: u32,

    /// Price per unit in cents.
    pub price_cents: i64,
}

impl From<LineItemDto> for LineItem {
    fn from(dto: LineItemDto) -> Self {
        Self::new(
            dto.product_id,
            dto.product_name,
            dto.quantity,
            Money::from_cents(dto.price_cents),
        )
    }
}

impl From<&LineItem> for LineItemDto {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price_cents: item.price.cents(),
        }
    }
}

/// Payment submitted with a request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentDto {
    /// Amount in cents.
    pub amount_cents: i64,

    /// Payment channel, e.g. "Cash" or "GCash".
    #[serde(default)]
    pub payment_method: String,

    /// Defaults to the time the payment is recorded.
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,

    /// Receipt reference.
    #[serde(default)]
    pub proof_of_payment: Option<String>,
}

impl PaymentDto {
    fn into_input(self, is_downpayment: bool) -> PaymentInput {
        PaymentInput {
            amount_paid: Money::from_cents(self.amount_cents),
            payment_method: self.payment_method,
            payment_date: self.payment_date,
            proof_of_payment: self.proof_of_payment,
            is_downpayment,
        }
    }
}

/// Request to book an event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateEventRequest {
    /// Descriptive fields.
    #[serde(flatten)]
    pub details: EventDetails,

    /// Initial products.
    #[serde(default)]
    pub products: Vec<LineItemDto>,

    /// Down payment taken at booking.
    #[serde(default)]
    pub down_payment: Option<PaymentDto>,
}

/// Request to amend an event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateEventBody {
    /// Replacement descriptive fields.
    pub details: Option<EventDetails>,

    /// Replacement product list.
    pub products: Option<Vec<LineItemDto>>,

    /// Payment to record.
    pub new_payment: Option<PaymentDto>,

    /// Total the client computed, in cents. Advisory only.
    pub total_amount_cents: Option<i64>,

    /// Discount override subtotal in cents.
    pub subtotal_cents: Option<i64>,

    /// Discount override amount in cents.
    pub discount_amount_cents: Option<i64>,

    /// Discount override rate in basis points.
    pub discount_percentage_bp: Option<u32>,

    /// Remove the discount override.
    pub clear_discount: bool,
}

impl From<UpdateEventBody> for UpdateEventRequest {
    fn from(body: UpdateEventBody) -> Self {
        Self {
            details: body.details,
            products: body.products.map(|p| p.into_iter().map(LineItem::from).collect()),
            new_payment: body.new_payment.map(|p| p.into_input(false)),
            total_amount: body.total_amount_cents.map(Money::from_cents),
            subtotal: body.subtotal_cents.map(Money::from_cents),
            discount_amount: body.discount_amount_cents.map(Money::from_cents),
            discount_percentage: body.discount_percentage_bp.map(Percentage::from_basis_points),
            clear_discount: body.clear_discount,
        }
    }
}

/// Recorded payment in a response.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    /// Amount in cents.
    pub amount_cents: i64,

    /// Payment channel.
    pub payment_method: String,

    /// When the payment was received (ISO 8601).
    pub payment_date: String,

    /// Receipt reference.
    pub proof_of_payment: Option<String>,

    /// Whether this was the down payment.
    pub is_downpayment: bool,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            amount_cents: payment.amount_paid.cents(),
            payment_method: payment.payment_method.clone(),
            payment_date: payment.payment_date.to_rfc3339(),
            proof_of_payment: payment.proof_of_payment.clone(),
            is_downpayment: payment.is_downpayment,
        }
    }
}

/// Active discount override in a response.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountResponse {
    /// Subtotal in cents.
    pub subtotal_cents: i64,

    /// Discount in cents.
    pub discount_amount_cents: i64,

    /// Rate in basis points.
    pub discount_percentage_bp: u32,
}

impl From<&DiscountOverride> for DiscountResponse {
    fn from(discount: &DiscountOverride) -> Self {
        Self {
            subtotal_cents: discount.subtotal.cents(),
            discount_amount_cents: discount.discount_amount.cents(),
            discount_percentage_bp: discount.discount_percentage.basis_points(),
        }
    }
}

/// Event details in a response.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    /// Event ID.
    pub id: String,

    /// Descriptive fields.
    #[serde(flatten)]
    pub details: EventDetails,

    /// Status ("Pending", "Fully Paid" or "Cancelled").
    pub status: String,

    /// Products.
    pub products: Vec<LineItemDto>,

    /// Payment history, oldest first.
    pub payments: Vec<PaymentResponse>,

    /// Active discount override.
    pub discount: Option<DiscountResponse>,

    /// Total in cents.
    pub total_amount_cents: i64,

    /// Paid so far in cents.
    pub total_paid_cents: i64,

    /// Outstanding balance in cents; negative when overpaid.
    pub remaining_balance_cents: i64,

    /// Outstanding balance formatted for display.
    pub remaining_balance: String,

    /// Stock currently held for this event.
    pub deducted_items: Vec<StockLine>,

    /// Stored revision.
    pub version: u64,

    /// Booked timestamp (ISO 8601).
    pub created_at: String,

    /// Last change timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<&Event> for EventResponse {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            details: event.details.clone(),
            status: event.status.to_string(),
            products: event.products.iter().map(LineItemDto::from).collect(),
            payments: event.payments().iter().map(PaymentResponse::from).collect(),
            discount: event.discount.as_ref().map(DiscountResponse::from),
            total_amount_cents: event.total_amount.cents(),
            total_paid_cents: event.total_paid.cents(),
            remaining_balance_cents: event.remaining_balance.cents(),
            remaining_balance: event.remaining_balance.to_string(),
            deducted_items: event.deducted_items().to_vec(),
            version: event.version.value(),
            created_at: event.created_at.to_rfc3339(),
            updated_at: event.updated_at.to_rfc3339(),
        }
    }
}

/// Event plus inventory result.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeResponse {
    /// Event as stored.
    pub event: EventResponse,

    /// Inventory side of the operation.
    pub inventory: InventoryResult,
}

impl From<EventOutcome> for OutcomeResponse {
    fn from(outcome: EventOutcome) -> Self {
        Self {
            event: EventResponse::from(&outcome.event),
            inventory: outcome.inventory,
        }
    }
}

/// Book an event.
///
/// # Endpoint
///
/// ```text
/// POST /events
/// Content-Type: application/json
///
/// {
///   "customer_name": "Maria Santos",
///   "address": "12 Mabini St",
///   "phone": "0917 000 0000",
///   "event_type": "Wedding",
///   "notes": "",
///   "event_date": "2025-06-14T15:00:00Z",
///   "products": [
///     {
///       "product_id": "rose-red",
///       "product_name": "Red Rose",
///       "quantity": 2,
///       "price_cents": 10000
///     }
///   ],
///   "down_payment": { "amount_cents": 5000 }
/// }
/// ```
///
/// # Errors
///
/// 422 on an invalid line item or down payment.
pub async fn create_event(
    State(ledger): State<Arc<EventLedger>>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<OutcomeResponse>), ApiError> {
    let new_event = NewEvent {
        details: request.details,
        products: request.products.into_iter().map(LineItem::from).collect(),
        down_payment: request.down_payment.map(|p| p.into_input(true)),
    };
    let outcome = ledger.create_event(new_event).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// List events, earliest event date first.
///
/// # Errors
///
/// 500 if the repository cannot be read.
pub async fn list_events(
    State(ledger): State<Arc<EventLedger>>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let events = ledger.list_events().await?;
    Ok(Json(events.iter().map(EventResponse::from).collect()))
}

/// Get one event.
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn get_event(
    State(ledger): State<Arc<EventLedger>>,
    Path(id): Path<EventId>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = ledger.get_event(id).await?;
    Ok(Json(EventResponse::from(&event)))
}

/// Amend an event and/or record a payment.
///
/// # Endpoint
///
/// ```text
/// PUT /events/:id
/// Content-Type: application/json
///
/// { "new_payment": { "amount_cents": 15000, "payment_method": "GCash" } }
/// ```
///
/// # Errors
///
/// 404 if the event does not exist, 422 on validation failure, 409 on a
/// concurrent modification.
pub async fn update_event(
    State(ledger): State<Arc<EventLedger>>,
    Path(id): Path<EventId>,
    Json(body): Json<UpdateEventBody>,
) -> Result<Json<OutcomeResponse>, ApiError> {
    let outcome = ledger.update_event(id, body.into()).await?;
    Ok(Json(outcome.into()))
}

/// Cancel an event and restore its stock.
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn cancel_event(
    State(ledger): State<Arc<EventLedger>>,
    Path(id): Path<EventId>,
) -> Result<Json<OutcomeResponse>, ApiError> {
    let outcome = ledger.cancel_event(id).await?;
    Ok(Json(outcome.into()))
}

/// Delete an event without touching inventory.
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn delete_event(
    State(ledger): State<Arc<EventLedger>>,
    Path(id): Path<EventId>,
) -> Result<StatusCode, ApiError> {
    ledger.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
