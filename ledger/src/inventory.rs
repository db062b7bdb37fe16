//! Inventory adapter used by the ledger.
//!
//! The ledger never reads or writes stock records directly. It hands a
//! batch of [`StockLine`]s to an [`InventoryStore`], which applies each line
//! as an independent atomic operation:
//!
//! - deduction decrements a product only if enough units are available, and
//!   reports a [`Shortage`] otherwise without aborting the rest of the batch
//! - restoration increments unconditionally
//!
//! [`InMemoryInventory`] is the implementation used by the binary and tests.

use crate::types::{ProductId, StockLine};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised by the inventory backend itself
///
/// A shortage is not an error; it is part of a [`DeductionOutcome`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryError {
    /// The backing store could not be reached or is unusable
    #[error("Inventory backend error: {0}")]
    Backend(String),
}

/// A line that could not be deducted because stock was too low
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    /// Product that ran short
    pub product_id: ProductId,
    /// Units the event needed
    pub requested: u32,
    /// Units on hand when the deduction was attempted
    pub available: u32,
}

/// Result of a deduction batch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    /// Lines that were deducted in full
    pub succeeded: Vec<StockLine>,
    /// Lines left untouched for lack of stock
    pub shortages: Vec<Shortage>,
}

impl DeductionOutcome {
    /// Number of lines deducted
    #[must_use]
    pub fn deducted_count(&self) -> usize {
        self.succeeded.len()
    }

    /// Number of lines in the batch
    #[must_use]
    pub fn requested_count(&self) -> usize {
        self.succeeded.len() + self.shortages.len()
    }

    /// Every line was deducted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shortages.is_empty()
    }
}

/// Keyed quantity store the ledger deducts from and restores to
///
/// Returns boxed futures so the trait stays object safe and can be held as
/// `Arc<dyn InventoryStore>` in the environment.
pub trait InventoryStore: Send + Sync {
    /// Conditionally decrement every line, independently of the others.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] only when the backend fails; shortages are
    /// reported inside the outcome.
    fn try_deduct(
        &self,
        items: Vec<StockLine>,
    ) -> BoxFuture<'_, Result<DeductionOutcome, InventoryError>>;

    /// Unconditionally increment every line.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the backend fails.
    fn restore(&self, items: Vec<StockLine>) -> BoxFuture<'_, Result<(), InventoryError>>;
}

/// Process-local inventory keyed by product id
///
/// Each line is applied under the lock on its own, so concurrent batches
/// touching the same product never interleave inside a single line.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    stock: Mutex<HashMap<ProductId, u32>>,
}

impl InMemoryInventory {
    /// Creates an empty inventory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory with initial quantities
    #[must_use]
    pub fn with_stock<I, P>(stock: I) -> Self
    where
        I: IntoIterator<Item = (P, u32)>,
        P: Into<ProductId>,
    {
        Self {
            stock: Mutex::new(stock.into_iter().map(|(id, qty)| (id.into(), qty)).collect()),
        }
    }

    /// Parses a JSON object mapping product ids to quantities
    ///
    /// # Errors
    ///
    /// Returns the parse error if the document is not such an object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let stock: HashMap<ProductId, u32> = serde_json::from_str(json)?;
        Ok(Self {
            stock: Mutex::new(stock),
        })
    }

    /// Units on hand, `None` for unknown products
    #[must_use]
    pub fn available(&self, product_id: &ProductId) -> Option<u32> {
        self.stock
            .lock()
            .ok()
            .and_then(|stock| stock.get(product_id).copied())
    }

    /// Sets the units on hand for a product
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Backend`] if the lock is poisoned.
    pub fn set_stock(
        &self,
        product_id: impl Into<ProductId>,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        self.lock()?.insert(product_id.into(), quantity);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<ProductId, u32>>, InventoryError> {
        self.stock
            .lock()
            .map_err(|_| InventoryError::Backend("inventory lock poisoned".to_string()))
    }

    /// Atomic conditional decrement of one product
    fn try_decrement(&self, line: &StockLine) -> Result<Result<(), Shortage>, InventoryError> {
        let mut stock = self.lock()?;
        let available = stock.get(&line.product_id).copied().unwrap_or(0);
        match stock.get_mut(&line.product_id) {
            Some(on_hand) if *on_hand >= line.quantity => {
                *on_hand -= line.quantity;
                Ok(Ok(()))
            },
            _ => Ok(Err(Shortage {
                product_id: line.product_id.clone(),
                requested: line.quantity,
                available,
            })),
        }
    }

    /// Unconditional increment of one product
    ///
    /// A product with no stock record gets one, so returned units are never dropped.
    fn increment(&self, line: &StockLine) -> Result<(), InventoryError> {
        let mut stock = self.lock()?;
        let on_hand = stock.entry(line.product_id.clone()).or_insert_with(|| {
            tracing::debug!(product_id = %line.product_id, "Creating stock record on restore");
            0
        });
        *on_hand = on_hand.saturating_add(line.quantity);
        Ok(())
    }
}

impl InventoryStore for InMemoryInventory {
    fn try_deduct(
        &self,
        items: Vec<StockLine>,
    ) -> BoxFuture<'_, Result<DeductionOutcome, InventoryError>> {
        Box::pin(async move {
            let mut outcome = DeductionOutcome::default();
            for line in items {
                match self.try_decrement(&line)? {
                    Ok(()) => outcome.succeeded.push(line),
                    Err(shortage) => outcome.shortages.push(shortage),
                }
            }
            Ok(outcome)
        })
    }

    fn restore(&self, items: Vec<StockLine>) -> BoxFuture<'_, Result<(), InventoryError>> {
        Box::pin(async move {
            for line in &items {
                self.increment(line)?;
            }
            Ok(())
        })
    }
}
