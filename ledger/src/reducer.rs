//! Event reducer: payment reconciliation and deferred inventory.
//!
//! Commands are validated against the current event before anything is
//! mutated. Accepted commands update the event in place, re-derive its
//! balances and status, and return a persistence effect. Inventory work is
//! parked in [`EventState::pending`] and only issued once that save has
//! succeeded, so stock never moves for a change that was not stored.
//!
//! Inventory results never undo a payment or a status change. Whatever was
//! actually deducted is recorded on the event, and cancellation restores
//! exactly that.

use crate::action::{
    DiscountChange, EventAction, EventState, EventUpdate, InventoryInstruction, Rejection,
};
use crate::inventory::InventoryStore;
use crate::repository::EventRepository;
use crate::types::{Event, EventDetails, EventId, EventStatus, LineItem, PaymentInput, StockLine};
use petal_core::effect::Effect;
use petal_core::environment::Clock;
use petal_core::reducer::Reducer;
use petal_core::{smallvec, SmallVec};
use std::sync::Arc;

/// Dependencies of the event reducer
#[derive(Clone)]
pub struct EventEnvironment {
    /// Timestamps for payments and `updated_at`
    pub clock: Arc<dyn Clock>,
    /// Stock to deduct from and restore to
    pub inventory: Arc<dyn InventoryStore>,
    /// Where events are persisted
    pub repository: Arc<dyn EventRepository>,
}

impl EventEnvironment {
    /// Creates a new event environment
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        inventory: Arc<dyn InventoryStore>,
        repository: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            clock,
            inventory,
            repository,
        }
    }
}

/// Reducer for a single event
#[derive(Clone, Debug, Default)]
pub struct EventReducer;

impl EventReducer {
    /// Creates a new event reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn validate_products(products: &[LineItem]) -> Result<(), Rejection> {
        for item in products {
            item.validate().map_err(|reason| Rejection::InvalidLineItem {
                product_id: item.product_id.clone(),
                reason,
            })?;
        }
        Ok(())
    }

    fn validate_payment(payment: &PaymentInput) -> Result<(), Rejection> {
        if payment.amount_paid.is_positive() {
            Ok(())
        } else {
            Err(Rejection::InvalidPayment {
                amount: payment.amount_paid,
            })
        }
    }

    fn validate_update(event: &Event, update: &EventUpdate) -> Result<(), Rejection> {
        if let Some(products) = &update.products {
            Self::validate_products(products)?;
        }
        if let Some(payment) = &update.payment {
            Self::validate_payment(payment)?;
        }
        let line_total = update
            .products
            .as_deref()
            .map_or_else(|| event.line_item_total(), |p| p.iter().map(LineItem::total).sum());
        if let Some(discount) = update.discount.to_override(line_total) {
            discount.validate().map_err(Rejection::InvalidDiscount)?;
        }
        Ok(())
    }

    fn reject(state: &mut EventState, reason: Rejection) -> SmallVec<[Effect<EventAction>; 4]> {
        tracing::warn!(%reason, "Command rejected");
        state.last_error = Some(reason.to_string());
        smallvec![Effect::emit(EventAction::Rejected { reason })]
    }

    /// Parks a deduction if this change settled the bill
    fn plan_deduction(state: &mut EventState, previous: EventStatus) {
        let Some(event) = &state.event else { return };
        if previous != EventStatus::Pending || event.status != EventStatus::FullyPaid {
            return;
        }
        tracing::info!(event_id = %event.id, total = %event.total_amount, "Event fully paid");
        let outstanding = event.outstanding_stock();
        if outstanding.is_empty() {
            tracing::debug!(event_id = %event.id, "No stock left to deduct");
        } else {
            state.pending = Some(InventoryInstruction::Deduct(outstanding));
        }
    }

    fn record_payment(event: &mut Event, payment: PaymentInput, env: &EventEnvironment) {
        tracing::info!(
            event_id = %event.id,
            amount = %payment.amount_paid,
            method = %payment.payment_method,
            downpayment = payment.is_downpayment,
            "Payment recorded"
        );
        metrics::counter!("ledger.payments.recorded").increment(1);
        event.record_payment(payment.into_payment(env.clock.now()));
    }

    /// Effect that saves the event at its current version
    fn persist(event: &Event, env: &EventEnvironment) -> Effect<EventAction> {
        let repository = Arc::clone(&env.repository);
        let expected = event.version;
        let event = event.clone();
        Effect::future(async move {
            Some(match repository.save(event, expected).await {
                Ok(version) => EventAction::Saved { version },
                Err(error) => EventAction::SaveFailed { error },
            })
        })
    }

    fn deduct(lines: Vec<StockLine>, env: &EventEnvironment) -> Effect<EventAction> {
        let inventory = Arc::clone(&env.inventory);
        Effect::future(async move {
            Some(match inventory.try_deduct(lines.clone()).await {
                Ok(outcome) => EventAction::StockDeducted { outcome },
                Err(error) => EventAction::StockDeductionFailed {
                    requested: lines,
                    error,
                },
            })
        })
    }

    fn restore(items: Vec<StockLine>, env: &EventEnvironment) -> Effect<EventAction> {
        let inventory = Arc::clone(&env.inventory);
        Effect::future(async move {
            Some(match inventory.restore(items.clone()).await {
                Ok(()) => EventAction::StockRestored { items },
                Err(error) => EventAction::StockRestorationFailed { items, error },
            })
        })
    }

    fn create(
        state: &mut EventState,
        id: EventId,
        details: EventDetails,
        products: Vec<LineItem>,
        down_payment: Option<PaymentInput>,
        env: &EventEnvironment,
    ) -> SmallVec<[Effect<EventAction>; 4]> {
        if state.event.is_some() {
            return Self::reject(state, Rejection::AlreadyExists);
        }
        if let Err(reason) = Self::validate_products(&products) {
            return Self::reject(state, reason);
        }
        if let Some(Err(reason)) = down_payment.as_ref().map(Self::validate_payment) {
            return Self::reject(state, reason);
        }

        let mut event = Event::new(id, details, products, env.clock.now());
        if let Some(mut payment) = down_payment {
            payment.is_downpayment = true;
            if payment.payment_method.trim().is_empty() {
                payment.payment_method = PaymentInput::DOWN_PAYMENT_METHOD.to_string();
            }
            Self::record_payment(&mut event, payment, env);
            event.recompute();
        }
        tracing::info!(
            event_id = %event.id,
            total = %event.total_amount,
            status = %event.status,
            "Event created"
        );

        let effect = Self::persist(&event, env);
        state.event = Some(event);
        state.last_error = None;
        Self::plan_deduction(state, EventStatus::Pending);
        smallvec![effect]
    }

    fn apply_update(
        state: &mut EventState,
        update: EventUpdate,
        env: &EventEnvironment,
    ) -> SmallVec<[Effect<EventAction>; 4]> {
        let Some(event) = state.event.as_mut() else {
            return Self::reject(state, Rejection::NotLoaded);
        };
        if let Err(reason) = Self::validate_update(event, &update) {
            return Self::reject(state, reason);
        }

        let previous = event.status;
        if let Some(details) = update.details {
            event.details = details;
        }
        if let Some(products) = update.products {
            event.products = products;
        }
        match &update.discount {
            DiscountChange::Keep => {},
            DiscountChange::Clear => event.discount = None,
            DiscountChange::Apply { .. } => {
                event.discount = update.discount.to_override(event.line_item_total());
            },
        }
        if let Some(payment) = update.payment {
            Self::record_payment(event, payment, env);
        }
        event.recompute();
        event.updated_at = env.clock.now();

        if let Some(expected) = update.expected_total.filter(|&total| total != event.total_amount) {
            tracing::warn!(
                event_id = %event.id,
                submitted = %expected,
                derived = %event.total_amount,
                "Submitted total differs from derived total; using derived"
            );
        }
        if previous != event.status {
            tracing::info!(
                event_id = %event.id,
                from = %previous,
                to = %event.status,
                "Status changed"
            );
        }

        let effect = Self::persist(event, env);
        state.last_error = None;
        Self::plan_deduction(state, previous);
        smallvec![effect]
    }

    fn cancel(
        state: &mut EventState,
        env: &EventEnvironment,
    ) -> SmallVec<[Effect<EventAction>; 4]> {
        let Some(event) = state.event.as_mut() else {
            return Self::reject(state, Rejection::NotLoaded);
        };
        let held = event.deducted_items().to_vec();
        if event.status == EventStatus::Cancelled && held.is_empty() && !state.unsynced {
            tracing::debug!(event_id = %event.id, "Event already cancelled");
            return smallvec![Effect::None];
        }

        if event.status != EventStatus::Cancelled {
            tracing::info!(event_id = %event.id, from = %event.status, "Event cancelled");
            event.status = EventStatus::Cancelled;
        } else if held.is_empty() {
            tracing::info!(event_id = %event.id, "Saving stock record of cancelled event");
        } else {
            tracing::info!(event_id = %event.id, lines = held.len(), "Retrying stock restoration");
        }
        event.updated_at = env.clock.now();

        let effect = Self::persist(event, env);
        state.last_error = None;
        if !held.is_empty() {
            state.pending = Some(InventoryInstruction::Restore(held));
        }
        smallvec![effect]
    }
}

impl Reducer for EventReducer {
    type State = EventState;
    type Action = EventAction;
    type Environment = EventEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            EventAction::Create {
                id,
                details,
                products,
                down_payment,
            } => Self::create(state, id, details, products, down_payment, env),

            EventAction::ApplyUpdate(update) => Self::apply_update(state, update, env),

            EventAction::Cancel => Self::cancel(state, env),

            // ========== Feedback ==========
            EventAction::Rejected { .. } => smallvec![Effect::None],

            EventAction::Saved { version } => {
                let Some(event) = state.event.as_mut() else {
                    return smallvec![Effect::None];
                };
                event.version = version;
                tracing::debug!(event_id = %event.id, %version, "Event saved");
                state.committed = Some(event.clone());
                state.unsynced = false;

                match state.pending.take() {
                    Some(InventoryInstruction::Deduct(lines)) => {
                        smallvec![Self::deduct(lines, env)]
                    },
                    Some(InventoryInstruction::Restore(items)) => {
                        smallvec![Self::restore(items, env)]
                    },
                    None => smallvec![Effect::None],
                }
            },

            EventAction::SaveFailed { error } => {
                tracing::error!(%error, "Failed to save event; rolling back to last stored state");
                state.event.clone_from(&state.committed);
                state.pending = None;
                state.last_error = Some(error.to_string());
                if state.unsynced {
                    tracing::warn!("Stock record held in memory until the next successful save");
                }
                smallvec![Effect::None]
            },

            EventAction::StockDeducted { outcome } => {
                let Some(event) = state.event.as_mut() else {
                    return smallvec![Effect::None];
                };
                metrics::counter!("ledger.inventory.deductions")
                    .increment(outcome.deducted_count() as u64);
                for shortage in &outcome.shortages {
                    tracing::warn!(
                        event_id = %event.id,
                        product_id = %shortage.product_id,
                        requested = shortage.requested,
                        available = shortage.available,
                        "Insufficient stock; line not deducted"
                    );
                }
                if !outcome.is_complete() {
                    metrics::counter!("ledger.inventory.shortages")
                        .increment(outcome.shortages.len() as u64);
                }
                if outcome.succeeded.is_empty() {
                    return smallvec![Effect::None];
                }

                tracing::info!(
                    event_id = %event.id,
                    deducted = outcome.deducted_count(),
                    requested = outcome.requested_count(),
                    "Stock deducted"
                );
                event.record_deduction(&outcome.succeeded);
                if let Some(committed) = state.committed.as_mut() {
                    committed.record_deduction(&outcome.succeeded);
                }
                state.unsynced = true;
                smallvec![Self::persist(event, env)]
            },

            EventAction::StockDeductionFailed { requested, error } => {
                tracing::error!(
                    %error,
                    lines = requested.len(),
                    "Stock deduction failed; payment stands"
                );
                state.last_error = Some(error.to_string());
                smallvec![Effect::None]
            },

            EventAction::StockRestored { items } => {
                let Some(event) = state.event.as_mut() else {
                    return smallvec![Effect::None];
                };
                metrics::counter!("ledger.inventory.restorations").increment(items.len() as u64);
                tracing::info!(event_id = %event.id, lines = items.len(), "Stock restored");
                event.release_deduction(&items);
                if let Some(committed) = state.committed.as_mut() {
                    committed.release_deduction(&items);
                }
                state.unsynced = true;
                smallvec![Self::persist(event, env)]
            },

            EventAction::StockRestorationFailed { items, error } => {
                tracing::error!(
                    %error,
                    lines = items.len(),
                    "Stock restoration failed; cancel again to retry"
                );
                state.last_error = Some(error.to_string());
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::inventory::{DeductionOutcome, InMemoryInventory, Shortage};
    use crate::repository::InMemoryEventRepository;
    use crate::types::{Money, Percentage};
    use petal_core::Version;
    use petal_testing::{assertions, test_clock, ReducerTest};

    fn env() -> EventEnvironment {
        EventEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(InMemoryInventory::with_stock([("rose", 10)])),
            Arc::new(InMemoryEventRepository::new()),
        )
    }

    fn roses(quantity: u32) -> LineItem {
        LineItem::new("rose", "Red Rose", quantity, Money::from_pesos(100))
    }

    fn event_with(products: Vec<LineItem>) -> Event {
        let now = test_clock().now();
        let mut event = Event::new(EventId::new(), EventDetails::default(), products, now);
        event.version = Version::new(1);
        event
    }

    fn payment(pesos: i64) -> EventUpdate {
        EventUpdate {
            payment: Some(PaymentInput::new(Money::from_pesos(pesos), "Cash")),
            ..EventUpdate::default()
        }
    }

    #[test]
    fn zero_payment_is_rejected_before_mutation() {
        let event = event_with(vec![roses(2)]);
        let before = event.clone();

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event))
            .when_action(EventAction::ApplyUpdate(EventUpdate {
                products: Some(vec![roses(5)]),
                ..payment(0)
            }))
            .then_state(move |state| {
                assert_eq!(state.event.as_ref(), Some(&before));
                assert!(state.pending.is_none());
                assert!(state.last_error.as_deref().unwrap().contains("positive"));
            })
            .run();
    }

    #[tokio::test]
    async fn rejection_is_fed_back() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event_with(vec![roses(1)])))
            .when_action(EventAction::ApplyUpdate(payment(-5)))
            .then_produces(|actions| {
                assert_eq!(
                    actions,
                    [EventAction::Rejected {
                        reason: Rejection::InvalidPayment {
                            amount: Money::from_pesos(-5)
                        }
                    }]
                );
            })
            .run_effects()
            .await;
    }

    #[test]
    fn settling_payment_parks_a_deduction() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event_with(vec![roses(2)])))
            .when_action(EventAction::ApplyUpdate(payment(200)))
            .then_state(|state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event.status, EventStatus::FullyPaid);
                assert_eq!(
                    state.pending,
                    Some(InventoryInstruction::Deduct(vec![StockLine::new("rose", 2)]))
                );
            })
            .then_effects(|effects| assertions::assert_has_work(effects))
            .run();
    }

    #[test]
    fn partial_payment_parks_nothing() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event_with(vec![roses(2)])))
            .when_action(EventAction::ApplyUpdate(payment(50)))
            .then_state(|state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event.status, EventStatus::Pending);
                assert_eq!(event.remaining_balance, Money::from_pesos(150));
                assert!(state.pending.is_none());
            })
            .run();
    }

    #[test]
    fn discount_without_subtotal_uses_line_total() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event_with(vec![roses(2)])))
            .when_action(EventAction::ApplyUpdate(EventUpdate {
                discount: DiscountChange::Apply {
                    subtotal: None,
                    discount_amount: Money::from_pesos(20),
                    discount_percentage: Percentage::from_percent(10),
                },
                ..EventUpdate::default()
            }))
            .then_state(|state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event.discount.unwrap().subtotal, Money::from_pesos(200));
                assert_eq!(event.total_amount, Money::from_pesos(180));
            })
            .run();
    }

    #[test]
    fn oversized_discount_is_rejected() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event_with(vec![roses(1)])))
            .when_action(EventAction::ApplyUpdate(EventUpdate {
                discount: DiscountChange::Apply {
                    subtotal: None,
                    discount_amount: Money::from_pesos(500),
                    discount_percentage: Percentage::ZERO,
                },
                ..EventUpdate::default()
            }))
            .then_state(|state| {
                assert!(state.event.as_ref().unwrap().discount.is_none());
                assert!(state.last_error.is_some());
            })
            .run();
    }

    #[test]
    fn saved_releases_the_parked_instruction() {
        let mut state = EventState::loaded(event_with(vec![roses(2)]));
        state.pending = Some(InventoryInstruction::Deduct(vec![StockLine::new("rose", 2)]));

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(EventAction::Saved {
                version: Version::new(2),
            })
            .then_state(|state| {
                assert!(state.pending.is_none());
                assert_eq!(state.event.as_ref().unwrap().version, Version::new(2));
            })
            .then_effects(|effects| assertions::assert_has_work(effects))
            .run();
    }

    #[test]
    fn save_failure_drops_the_parked_instruction() {
        let mut state = EventState::loaded(event_with(vec![roses(2)]));
        state.pending = Some(InventoryInstruction::Deduct(vec![StockLine::new("rose", 2)]));

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(EventAction::SaveFailed {
                error: crate::repository::RepositoryError::Backend("disk full".to_string()),
            })
            .then_state(|state| assert!(state.pending.is_none()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn shortages_only_record_what_was_deducted() {
        let tulips = LineItem::new("tulip", "Tulip", 3, Money::from_pesos(50));
        let mut event = event_with(vec![roses(2), tulips]);
        event.status = EventStatus::FullyPaid;

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event))
            .when_action(EventAction::StockDeducted {
                outcome: DeductionOutcome {
                    succeeded: vec![StockLine::new("rose", 2)],
                    shortages: vec![Shortage {
                        product_id: "tulip".into(),
                        requested: 3,
                        available: 1,
                    }],
                },
            })
            .then_state(|state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event.deducted_items(), [StockLine::new("rose", 2)]);
                assert_eq!(event.status, EventStatus::FullyPaid);
                let committed = state.committed.as_ref().unwrap();
                assert_eq!(committed.deducted_items(), [StockLine::new("rose", 2)]);
                assert!(state.unsynced);
            })
            .run();
    }

    #[test]
    fn save_failure_rolls_back_the_command() {
        let stored = event_with(vec![roses(2)]);
        let mut state = EventState::loaded(stored.clone());
        let event = state.event.as_mut().unwrap();
        let paid = PaymentInput::new(Money::from_pesos(200), "Cash");
        event.record_payment(paid.into_payment(test_clock().now()));
        event.recompute();
        state.pending = Some(InventoryInstruction::Deduct(vec![StockLine::new("rose", 2)]));

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(EventAction::SaveFailed {
                error: crate::repository::RepositoryError::Backend("disk full".to_string()),
            })
            .then_state(move |state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event, &stored);
                assert_eq!(event.status, EventStatus::Pending);
                assert!(event.payments().is_empty());
                assert!(state.pending.is_none());
            })
            .run();
    }

    #[test]
    fn failed_create_leaves_no_event() {
        let mut state = EventState::new();
        state.event = Some(event_with(vec![roses(1)]));

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(EventAction::SaveFailed {
                error: crate::repository::RepositoryError::Backend("disk full".to_string()),
            })
            .then_state(|state| assert!(state.event.is_none()))
            .run();
    }

    #[test]
    fn save_failure_keeps_the_stock_record() {
        let mut event = event_with(vec![roses(2)]);
        event.status = EventStatus::FullyPaid;
        event.record_deduction(&[StockLine::new("rose", 2)]);
        let mut state = EventState::loaded(event);
        state.unsynced = true;

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(EventAction::SaveFailed {
                error: crate::repository::RepositoryError::Backend("disk full".to_string()),
            })
            .then_state(|state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event.deducted_items(), [StockLine::new("rose", 2)]);
                assert!(state.unsynced);
            })
            .run();
    }

    #[test]
    fn cancelling_again_saves_an_unsynced_stock_record() {
        let mut event = event_with(vec![roses(2)]);
        event.status = EventStatus::Cancelled;
        let mut state = EventState::loaded(event);
        state.unsynced = true;

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(EventAction::Cancel)
            .then_state(|state| {
                assert_eq!(state.event.as_ref().unwrap().status, EventStatus::Cancelled);
                assert!(state.pending.is_none());
            })
            .then_effects(|effects| assertions::assert_has_work(effects))
            .run();
    }

    #[test]
    fn cancel_parks_restoration_of_the_snapshot() {
        let mut event = event_with(vec![roses(2)]);
        event.status = EventStatus::FullyPaid;
        event.record_deduction(&[StockLine::new("rose", 2)]);

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event))
            .when_action(EventAction::Cancel)
            .then_state(|state| {
                assert_eq!(state.event.as_ref().unwrap().status, EventStatus::Cancelled);
                assert_eq!(
                    state.pending,
                    Some(InventoryInstruction::Restore(vec![StockLine::new("rose", 2)]))
                );
            })
            .run();
    }

    #[test]
    fn cancelling_twice_is_a_noop() {
        let mut event = event_with(vec![roses(2)]);
        event.status = EventStatus::Cancelled;

        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::loaded(event))
            .when_action(EventAction::Cancel)
            .then_state(|state| assert!(state.pending.is_none()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn create_with_settling_down_payment_deducts() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::new())
            .when_action(EventAction::Create {
                id: EventId::new(),
                details: EventDetails::default(),
                products: vec![roses(1)],
                down_payment: Some(PaymentInput::new(Money::from_pesos(100), "")),
            })
            .then_state(|state| {
                let event = state.event.as_ref().unwrap();
                assert_eq!(event.status, EventStatus::FullyPaid);
                assert_eq!(event.payments()[0].payment_method, PaymentInput::DOWN_PAYMENT_METHOD);
                assert!(event.payments()[0].is_downpayment);
                assert!(matches!(state.pending, Some(InventoryInstruction::Deduct(_))));
            })
            .run();
    }

    #[test]
    fn update_before_load_is_rejected() {
        ReducerTest::new(EventReducer::new())
            .with_env(env())
            .given_state(EventState::new())
            .when_action(EventAction::Cancel)
            .then_state(|state| assert_eq!(state.last_error.as_deref(), Some("No event loaded")))
            .run();
    }
}
