//! Event payment and inventory reconciliation for the Petal flower-shop POS.
//!
//! An event is a customer order for a scheduled occasion. Its product list
//! and payment history change over time; totals, balance and status are
//! always derived from them. Stock is deducted once, when the event first
//! becomes fully paid, and given back if the event is cancelled.
//!
//! # Architecture
//!
//! 1. [`EventLedger`] is the service callers use
//! 2. Each event gets its own [`petal_runtime::Store`] running the
//!    [`EventReducer`], which serializes all changes to that event
//! 3. The reducer validates commands, mutates the [`Event`], and returns
//!    effects that persist it through an [`EventRepository`]
//! 4. Once a save succeeds, parked inventory work runs against an
//!    [`InventoryStore`] and its result is fed back and recorded
//!
//! # Example Usage
//!
//! ```no_run
//! use event_ledger::{
//!     EventEnvironment, EventLedger, InMemoryEventRepository, InMemoryInventory, NewEvent,
//!     UpdateEventRequest,
//! };
//! use event_ledger::types::{LineItem, Money, PaymentInput};
//! use petal_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), event_ledger::LedgerError> {
//! let env = EventEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(InMemoryInventory::with_stock([("rose-red", 24)])),
//!     Arc::new(InMemoryEventRepository::new()),
//! );
//! let ledger = EventLedger::new(env);
//!
//! let booked = ledger
//!     .create_event(NewEvent {
//!         products: vec![LineItem::new("rose-red", "Red Rose", 2, Money::from_pesos(100))],
//!         down_payment: Some(PaymentInput::down_payment(Money::from_pesos(50))),
//!         ..NewEvent::default()
//!     })
//!     .await?;
//!
//! let settled = ledger
//!     .update_event(
//!         booked.event.id,
//!         UpdateEventRequest::payment(PaymentInput::new(Money::from_pesos(150), "GCash")),
//!     )
//!     .await?;
//! println!("{} with {:?}", settled.event.status, settled.inventory);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod inventory;
pub mod ledger;
pub mod reducer;
pub mod repository;
pub mod types;

#[cfg(feature = "http")]
pub mod error;
#[cfg(feature = "http")]
pub mod handlers;
#[cfg(feature = "http")]
pub mod router;

pub use action::{
    DiscountChange, EventAction, EventState, EventUpdate, InventoryInstruction, Rejection,
};
pub use config::Config;
pub use inventory::{DeductionOutcome, InMemoryInventory, InventoryError, InventoryStore, Shortage};
pub use ledger::{
    CancelOutcome, EventLedger, EventOutcome, InventoryResult, LedgerError, NewEvent,
    UpdateEventRequest, UpdateOutcome,
};
pub use reducer::{EventEnvironment, EventReducer};
pub use repository::{EventRepository, InMemoryEventRepository, RepositoryError};
pub use types::{Event, EventId, EventStatus};
