//! Property tests for balance and status derivation.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chrono::Utc;
use event_ledger::types::{
    derive_status, DiscountOverride, EventDetails, LineItem, Money, PaymentInput, Percentage,
    ProductId,
};
use event_ledger::{
    Event, EventEnvironment, EventId, EventLedger, EventStatus, InMemoryEventRepository,
    InMemoryInventory, InventoryStore, NewEvent, UpdateEventRequest,
};
use petal_testing::test_clock;
use proptest::prelude::*;
use std::sync::Arc;

fn line_items() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec(
        ("[a-e]", 1_u32..20, 0_i64..50_000).prop_map(|(id, qty, cents)| {
            LineItem::new(id.clone(), id, qty, Money::from_cents(cents))
        }),
        0..6,
    )
}

fn payments() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1_i64..200_000, 0..6)
}

proptest! {
    #[test]
    fn balances_follow_products_and_payments(products in line_items(), paid in payments()) {
        let line_total: i64 = products
            .iter()
            .map(|p| p.price.cents() * i64::from(p.quantity))
            .sum();
        let units: u32 = products.iter().map(|p| p.quantity).sum();
        let stock = ["a", "b", "c", "d", "e"].map(|id| (id, 1_000));
        let inventory = Arc::new(InMemoryInventory::with_stock(stock));
        let ledger = EventLedger::new(EventEnvironment::new(
            Arc::new(test_clock()),
            Arc::clone(&inventory) as Arc<dyn InventoryStore>,
            Arc::new(InMemoryEventRepository::new()),
        ));
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

        runtime.block_on(async {
            let request = NewEvent { products, ..NewEvent::default() };
            let mut event = ledger.create_event(request).await.unwrap().event;
            let mut paid_total = 0_i64;
            for cents in paid {
                let payment = PaymentInput::new(Money::from_cents(cents), "Cash");
                let request = UpdateEventRequest::payment(payment);
                event = ledger.update_event(event.id, request).await.unwrap().event;
                paid_total += cents;

                prop_assert_eq!(event.total_amount.cents(), line_total);
                prop_assert_eq!(event.total_paid.cents(), paid_total);
                prop_assert_eq!(event.remaining_balance.cents(), line_total - paid_total);
                let expected = if line_total > 0 && paid_total >= line_total {
                    EventStatus::FullyPaid
                } else {
                    EventStatus::Pending
                };
                prop_assert_eq!(event.status, expected);
            }

            let held: u32 = event.deducted_items().iter().map(|l| l.quantity).sum();
            let expected_held = if event.status == EventStatus::FullyPaid { units } else { 0 };
            prop_assert_eq!(held, expected_held);
            let on_hand: u32 = ["a", "b", "c", "d", "e"]
                .iter()
                .filter_map(|id| inventory.available(&ProductId::new(*id)))
                .sum();
            prop_assert_eq!(on_hand + held, 5_000);
            Ok(())
        })?;
    }

    #[test]
    fn cancelled_is_terminal(total in 0_i64..1_000_000, remaining in -1_000_000_i64..1_000_000) {
        prop_assert_eq!(
            derive_status(
                EventStatus::Cancelled,
                Money::from_cents(total),
                Money::from_cents(remaining)
            ),
            EventStatus::Cancelled
        );
    }

    #[test]
    fn zero_total_keeps_status(remaining in -1_000_000_i64..1_000_000) {
        for current in [EventStatus::Pending, EventStatus::FullyPaid] {
            let derived = derive_status(current, Money::ZERO, Money::from_cents(remaining));
            prop_assert_eq!(derived, current);
        }
    }

    #[test]
    fn override_total_wins(
        products in line_items(),
        subtotal in 0_i64..1_000_000,
        off in 0_i64..1_000_000,
    ) {
        let discount_amount = off.min(subtotal);
        let mut event = Event::new(EventId::new(), EventDetails::default(), products, Utc::now());
        event.discount = Some(DiscountOverride {
            subtotal: Money::from_cents(subtotal),
            discount_amount: Money::from_cents(discount_amount),
            discount_percentage: Percentage::ZERO,
        });
        event.recompute();
        prop_assert_eq!(event.total_amount.cents(), subtotal - discount_amount);
    }
}

#[test]
fn request_without_discount_fields_keeps_override() {
    let request = UpdateEventRequest::payment(PaymentInput::new(Money::from_pesos(1), "Cash"));
    assert!(!request.clear_discount);
    assert!(request.subtotal.is_none() && request.discount_amount.is_none());
}
