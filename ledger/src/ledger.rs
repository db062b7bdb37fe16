//! The event ledger service.
//!
//! [`EventLedger`] is the entry point callers use. It keeps one [`Store`]
//! per event id, created on first use from the repository, so operations
//! on the same event are serialized while different events proceed
//! independently.
//!
//! Each operation sends one command and then reads the actions the store
//! fed back to decide what happened: a rejection becomes a [`LedgerError`],
//! inventory feedback becomes an [`InventoryResult`].

use crate::action::{DiscountChange, EventAction, EventState, EventUpdate, Rejection};
use crate::inventory::DeductionOutcome;
use crate::reducer::{EventEnvironment, EventReducer};
use crate::repository::RepositoryError;
use crate::types::{
    Event, EventDetails, EventId, LineItem, Money, PaymentInput, Percentage, ProductId, StockLine,
};
use petal_runtime::{Store, StoreConfig, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

type LedgerStore = Store<EventState, EventAction, EventEnvironment, EventReducer>;

/// Errors returned by ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Payment amount was zero or negative; nothing was changed
    #[error("Payment amount must be positive, got {amount}")]
    InvalidPayment {
        /// Submitted amount
        amount: Money,
    },

    /// A line item broke the quantity or price rules; nothing was changed
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

    /// No event with this id exists
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// Persistence failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The store runtime failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    fn from_rejection(id: EventId, reason: Rejection) -> Self {
        match reason {
            Rejection::InvalidPayment { amount } => Self::InvalidPayment { amount },
            Rejection::InvalidLineItem { product_id, reason } => {
                Self::InvalidLineItem { product_id, reason }
            },
            Rejection::InvalidDiscount(reason) => Self::InvalidDiscount(reason),
            Rejection::AlreadyExists => Self::Repository(RepositoryError::AlreadyExists(id)),
            Rejection::NotLoaded => Self::EventNotFound(id),
        }
    }
}

/// What happened to inventory as part of an operation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryResult {
    /// No inventory call was needed
    #[default]
    NotAttempted,
    /// A deduction ran; shortages are listed, not fatal
    Deducted(DeductionOutcome),
    /// Previously deducted stock was put back
    Restored {
        /// Lines restored
        items: Vec<StockLine>,
    },
    /// The inventory backend failed; the event change still stands
    Failed {
        /// Lines the call was about
        requested: Vec<StockLine>,
        /// Backend error
        error: String,
    },
}

/// Saved event plus the separate inventory result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Event as stored
    pub event: Event,
    /// Inventory side of the operation
    pub inventory: InventoryResult,
}

/// Result of an update
pub type UpdateOutcome = EventOutcome;

/// Result of a cancellation
pub type CancelOutcome = EventOutcome;

/// Input for booking an event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Descriptive fields
    #[serde(flatten)]
    pub details: EventDetails,
    /// Initial products
    #[serde(default)]
    pub products: Vec<LineItem>,
    /// Down payment taken at booking
    #[serde(default)]
    pub down_payment: Option<PaymentInput>,
}

/// Amendments to an existing event
///
/// The discount fields follow the booking screen: any of `subtotal`,
/// `discount_amount` or `discount_percentage` installs an override, and
/// `clear_discount` removes it. `total_amount` is only compared against
/// the derived total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateEventRequest {
    /// Replacement descriptive fields
    pub details: Option<EventDetails>,
    /// Replacement product list
    pub products: Option<Vec<LineItem>>,
    /// Payment to append
    pub new_payment: Option<PaymentInput>,
    /// Total the client computed
    pub total_amount: Option<Money>,
    /// Override subtotal
    pub subtotal: Option<Money>,
    /// Override discount
    pub discount_amount: Option<Money>,
    /// Override rate
    pub discount_percentage: Option<Percentage>,
    /// Drop the override
    pub clear_discount: bool,
}

impl UpdateEventRequest {
    /// A request that only records a payment
    #[must_use]
    pub fn payment(payment: PaymentInput) -> Self {
        Self {
            new_payment: Some(payment),
            ..Self::default()
        }
    }

    fn into_update(self) -> EventUpdate {
        let discount = if self.clear_discount {
            DiscountChange::Clear
        } else if self.subtotal.is_some()
            || self.discount_amount.is_some()
            || self.discount_percentage.is_some()
        {
            DiscountChange::Apply {
                subtotal: self.subtotal,
                discount_amount: self.discount_amount.unwrap_or(Money::ZERO),
                discount_percentage: self.discount_percentage.unwrap_or(Percentage::ZERO),
            }
        } else {
            DiscountChange::Keep
        };
        EventUpdate {
            details: self.details,
            products: self.products,
            payment: self.new_payment,
            discount,
            expected_total: self.total_amount,
        }
    }
}

/// Event payment and inventory reconciliation service
pub struct EventLedger {
    environment: EventEnvironment,
    config: StoreConfig,
    stores: Mutex<HashMap<EventId, Arc<LedgerStore>>>,
}

impl EventLedger {
    /// Creates a ledger with the default store configuration
    #[must_use]
    pub fn new(environment: EventEnvironment) -> Self {
        Self::with_config(environment, StoreConfig::default())
    }

    /// Creates a ledger with an explicit store configuration
    #[must_use]
    pub fn with_config(environment: EventEnvironment, config: StoreConfig) -> Self {
        Self {
            environment,
            config,
            stores: Mutex::new(HashMap::new()),
        }
    }

    fn new_store(&self, state: EventState) -> Arc<LedgerStore> {
        Arc::new(Store::with_config(
            state,
            EventReducer::new(),
            self.environment.clone(),
            self.config.clone(),
        ))
    }

    /// Store for an existing event, loading it on first use
    async fn store_for(&self, id: EventId) -> Result<Arc<LedgerStore>, LedgerError> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(&id) {
            return Ok(Arc::clone(store));
        }
        let event = self
            .environment
            .repository
            .load(id)
            .await?
            .ok_or(LedgerError::EventNotFound(id))?;
        let store = self.new_store(EventState::loaded(event));
        stores.insert(id, Arc::clone(&store));
        Ok(store)
    }

    async fn evict(&self, id: EventId) {
        self.stores.lock().await.remove(&id);
    }

    /// Sends a command and turns the feedback into an outcome
    async fn run(
        &self,
        id: EventId,
        store: &LedgerStore,
        command: EventAction,
    ) -> Result<EventOutcome, LedgerError> {
        let produced = match store.send(command).await {
            Ok(produced) => produced,
            Err(error) => {
                self.evict(id).await;
                return Err(error.into());
            },
        };

        let mut saved = false;
        let mut inventory = InventoryResult::NotAttempted;
        for action in produced {
            match action {
                EventAction::Rejected { reason } => {
                    return Err(LedgerError::from_rejection(id, reason));
                },
                EventAction::Saved { .. } => saved = true,
                EventAction::SaveFailed { error } if !saved => {
                    // The store has rolled back; reload only if storage moved on without it
                    if matches!(
                        error,
                        RepositoryError::VersionConflict { .. } | RepositoryError::NotFound(_)
                    ) {
                        self.evict(id).await;
                    }
                    return Err(error.into());
                },
                EventAction::SaveFailed { error } => {
                    tracing::error!(
                        event_id = %id,
                        %error,
                        "Follow-up save failed; stock record kept for the next save"
                    );
                },
                EventAction::StockDeducted { outcome } => {
                    inventory = InventoryResult::Deducted(outcome);
                },
                EventAction::StockRestored { items } => {
                    inventory = InventoryResult::Restored { items };
                },
                EventAction::StockDeductionFailed { requested, error } => {
                    inventory = InventoryResult::Failed {
                        requested,
                        error: error.to_string(),
                    };
                },
                EventAction::StockRestorationFailed { items, error } => {
                    inventory = InventoryResult::Failed {
                        requested: items,
                        error: error.to_string(),
                    };
                },
                EventAction::Create { .. }
                | EventAction::ApplyUpdate(_)
                | EventAction::Cancel => {},
            }
        }

        let event = store
            .state(|state| state.event.clone())
            .await
            .ok_or(LedgerError::EventNotFound(id))?;
        Ok(EventOutcome { event, inventory })
    }

    /// Books a new event, optionally with a down payment
    ///
    /// A down payment that already covers the total deducts stock right away.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidPayment`] for a non-positive down payment
    /// - [`LedgerError::InvalidLineItem`] for a bad product line
    /// - [`LedgerError::Repository`] if the event cannot be stored
    #[tracing::instrument(skip(self, request), fields(customer = %request.details.customer_name))]
    pub async fn create_event(&self, request: NewEvent) -> Result<UpdateOutcome, LedgerError> {
        let id = EventId::new();
        let store = self.new_store(EventState::new());
        let command = EventAction::Create {
            id,
            details: request.details,
            products: request.products,
            down_payment: request.down_payment,
        };
        let outcome = self.run(id, &store, command).await?;
        self.stores.lock().await.entry(id).or_insert(store);
        Ok(outcome)
    }

    /// Amends an event and/or records a payment
    ///
    /// Validation happens before anything changes. If the change settles
    /// the bill, stock not yet deducted for this event is deducted and the
    /// result is reported in [`EventOutcome::inventory`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`] if the event does not exist
    /// - [`LedgerError::InvalidPayment`], [`LedgerError::InvalidLineItem`]
    ///   or [`LedgerError::InvalidDiscount`] when validation fails
    /// - [`LedgerError::Repository`] if the change cannot be stored
    #[tracing::instrument(skip(self, request))]
    pub async fn update_event(
        &self,
        id: EventId,
        request: UpdateEventRequest,
    ) -> Result<UpdateOutcome, LedgerError> {
        let store = self.store_for(id).await?;
        self.run(id, &store, EventAction::ApplyUpdate(request.into_update())).await
    }

    /// Cancels an event and restores whatever stock it holds
    ///
    /// Cancelling again is a no-op unless an earlier restoration failed, in
    /// which case it is retried.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`] if the event does not exist
    /// - [`LedgerError::Repository`] if the cancellation cannot be stored
    #[tracing::instrument(skip(self))]
    pub async fn cancel_event(&self, id: EventId) -> Result<CancelOutcome, LedgerError> {
        let store = self.store_for(id).await?;
        self.run(id, &store, EventAction::Cancel).await
    }

    /// Fetches an event
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EventNotFound`] if the event does not exist.
    pub async fn get_event(&self, id: EventId) -> Result<Event, LedgerError> {
        let store = self.store_for(id).await?;
        store
            .state(|state| state.event.clone())
            .await
            .ok_or(LedgerError::EventNotFound(id))
    }

    /// All events, earliest event date first
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if the repository cannot be read.
    pub async fn list_events(&self) -> Result<Vec<Event>, LedgerError> {
        let mut events = self.environment.repository.list().await?;
        events.sort_by(|a, b| {
            a.details
                .event_date
                .cmp(&b.details.event_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(events)
    }

    /// Removes an event without touching inventory
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EventNotFound`] if the event does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_event(&self, id: EventId) -> Result<(), LedgerError> {
        let mut stores = self.stores.lock().await;
        match self.environment.repository.delete(id).await {
            Ok(()) => {
                stores.remove(&id);
                tracing::info!(event_id = %id, "Event deleted");
                Ok(())
            },
            Err(RepositoryError::NotFound(_)) => Err(LedgerError::EventNotFound(id)),
            Err(error) => Err(error.into()),
        }
    }
}
