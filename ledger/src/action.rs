//! Actions and state for the event reducer.
//!
//! Commands come from the ledger service; everything else is feedback
//! produced by effects (persistence and inventory calls) and fed back into
//! the reducer by the store.

use crate::inventory::{DeductionOutcome, InventoryError};
use crate::repository::RepositoryError;
use crate::types::{
    DiscountOverride, Event, EventDetails, EventId, LineItem, Money, PaymentInput, Percentage,
    ProductId, StockLine,
};
use petal_core::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an update treats the manual discount override
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountChange {
    /// Leave the current override (or its absence) alone
    #[default]
    Keep,
    /// Install or replace the override
    Apply {
        /// Pre-discount amount; the line item total when omitted
        subtotal: Option<Money>,
        /// Amount taken off
        discount_amount: Money,
        /// Informational rate
        discount_percentage: Percentage,
    },
    /// Go back to the line item total
    Clear,
}

/// Changes requested by a single update
///
/// Every field is optional; an empty update only refreshes `updated_at`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    /// Replacement descriptive fields
    pub details: Option<EventDetails>,
    /// Replacement product list
    pub products: Option<Vec<LineItem>>,
    /// Payment to append
    pub payment: Option<PaymentInput>,
    /// Discount override change
    pub discount: DiscountChange,
    /// Total the caller believes the event has; compared, never applied
    pub expected_total: Option<Money>,
}

/// Why a command was refused without touching the event
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Payment amount was zero or negative
    #[error("Payment amount must be positive, got {amount}")]
    InvalidPayment {
        /// Submitted amount
        amount: Money,
    },
    /// A line item broke the quantity or price rules
    #[error("Invalid line item {product_id}: {reason}")]
    InvalidLineItem {
        /// Offending product
        product_id: ProductId,
        /// What is wrong with it
        reason: String,
    },
    /// The discount override does not describe a valid total
    #[error("Invalid discount: {0}")]
    InvalidDiscount(String),
    /// `Create` was sent to a store that already holds an event
    #[error("Event already exists")]
    AlreadyExists,
    /// An update or cancel was sent before any event was loaded
    #[error("No event loaded")]
    NotLoaded,
}

/// Inventory work waiting for the current save to succeed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InventoryInstruction {
    /// Take these quantities out of stock
    Deduct(Vec<StockLine>),
    /// Put these quantities back
    Restore(Vec<StockLine>),
}

/// State of one event's store
#[derive(Clone, Debug, Default)]
pub struct EventState {
    /// The event, once created or loaded
    pub event: Option<Event>,
    /// Inventory call to issue after the next successful save
    pub pending: Option<InventoryInstruction>,
    /// Most recent rejection or failure, for observability
    pub last_error: Option<String>,
    /// Event as last stored, plus any stock movement already made for it
    ///
    /// A failed save rolls `event` back to this.
    pub committed: Option<Event>,
    /// `committed` records stock movement the repository has not seen yet
    pub unsynced: bool,
}

impl EventState {
    /// State for an event that does not exist yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State wrapping an event loaded from the repository
    #[must_use]
    pub fn loaded(event: Event) -> Self {
        Self {
            committed: Some(event.clone()),
            event: Some(event),
            ..Self::default()
        }
    }
}

/// Everything the event reducer accepts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventAction {
    // Commands
    /// Book a new event
    Create {
        /// Identifier for the new event
        id: EventId,
        /// Descriptive fields
        details: EventDetails,
        /// Initial products
        products: Vec<LineItem>,
        /// Optional down payment
        down_payment: Option<PaymentInput>,
    },
    /// Amend products, discount or details, and/or append a payment
    ApplyUpdate(EventUpdate),
    /// Cancel the event and give back any deducted stock
    Cancel,

    // Feedback
    /// A command was refused; the event is unchanged
    Rejected {
        /// Reason for refusal
        reason: Rejection,
    },
    /// The event was written to the repository
    Saved {
        /// New stored version
        version: Version,
    },
    /// The repository refused or failed the write
    SaveFailed {
        /// Repository error
        error: RepositoryError,
    },
    /// A deduction batch ran, possibly with shortages
    StockDeducted {
        /// Per-line result
        outcome: DeductionOutcome,
    },
    /// The inventory backend failed before deducting anything
    StockDeductionFailed {
        /// Lines that were to be deducted
        requested: Vec<StockLine>,
        /// Backend error
        error: InventoryError,
    },
    /// Stock was put back
    StockRestored {
        /// Lines restored
        items: Vec<StockLine>,
    },
    /// The inventory backend failed to restore
    StockRestorationFailed {
        /// Lines that were to be restored
        items: Vec<StockLine>,
        /// Backend error
        error: InventoryError,
    },
}

impl DiscountChange {
    /// Builds the override this change installs, if any
    ///
    /// `line_total` fills in a missing subtotal.
    #[must_use]
    pub fn to_override(&self, line_total: Money) -> Option<DiscountOverride> {
        match self {
            Self::Apply {
                subtotal,
                discount_amount,
                discount_percentage,
            } => Some(DiscountOverride {
                subtotal: subtotal.unwrap_or(line_total),
                discount_amount: *discount_amount,
                discount_percentage: *discount_percentage,
            }),
            Self::Keep | Self::Clear => None,
        }
    }
}
