//! Core domain types for event orders.
//!
//! An event is a scheduled customer order (a wedding, a debut, a funeral
//! wreath order) whose product list and payment history evolve over time.
//! Balances and status are derived from those two lists on every change;
//! see [`Event::recompute`].

use chrono::{DateTime, Utc};
use petal_core::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an event, assigned at creation
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generates a fresh random identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Catalog identifier of a product
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new `ProductId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount in centavos
///
/// All accumulation and comparison happens on the integer value; the two
/// decimal places only appear when the amount is displayed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero pesos
    pub const ZERO: Self = Self(0);

    /// Creates a money amount from centavos
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a money amount from whole pesos
    #[must_use]
    pub const fn from_pesos(pesos: i64) -> Self {
        Self(pesos.saturating_mul(100))
    }

    /// Returns the value in centavos
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Strictly greater than zero
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Less than zero
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Unit price times quantity
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}₱{}.{:02}", abs / 100, abs % 100)
    }
}

/// Percentage in basis points (1/100 of a percent)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u32);

impl Percentage {
    /// No discount
    pub const ZERO: Self = Self(0);

    /// Creates a percentage from basis points (`1250` is 12.5%)
    #[must_use]
    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    /// Creates a percentage from whole percent
    #[must_use]
    pub const fn from_percent(percent: u32) -> Self {
        Self(percent.saturating_mul(100))
    }

    /// Returns the value in basis points
    #[must_use]
    pub const fn basis_points(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// A product selected for an event
///
/// Name and price are copied when the item is added and never follow later
/// catalog edits, so historical orders keep their original amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product
    pub product_id: ProductId,
    /// Product name at selection time
    pub product_name: String,
    /// Units ordered, must be positive
    pub quantity: u32,
    /// Unit price at selection time, must not be negative
    pub price: Money,
}

impl LineItem {
    /// Creates a new line item
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price,
        }
    }

    /// Quantity times price
    #[must_use]
    pub const fn total(&self) -> Money {
        self.price.times(self.quantity)
    }

    /// Checks the quantity and price rules
    ///
    /// # Errors
    ///
    /// Returns a human readable reason when the item is not acceptable.
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity == 0 {
            return Err(format!("'{}' has zero quantity", self.product_name));
        }
        if self.price.is_negative() {
            return Err(format!("'{}' has a negative price", self.product_name));
        }
        Ok(())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One recorded payment toward an event
///
/// Payments are append-only: once recorded they are never edited or removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Amount received, always positive
    pub amount_paid: Money,
    /// When the payment was received
    pub payment_date: DateTime<Utc>,
    /// Free-form channel, e.g. "Cash", "GCash", "Bank"
    pub payment_method: String,
    /// Reference to an uploaded receipt, if any
    pub proof_of_payment: Option<String>,
    /// Whether this was the initial down payment
    pub is_downpayment: bool,
}

/// Payment as submitted by a caller, before it is stamped and recorded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Amount received
    pub amount_paid: Money,
    /// Free-form channel
    pub payment_method: String,
    /// Defaults to the time the payment is recorded
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    /// Reference to an uploaded receipt
    #[serde(default)]
    pub proof_of_payment: Option<String>,
    /// Whether this is a down payment
    #[serde(default)]
    pub is_downpayment: bool,
}

impl PaymentInput {
    /// Payment method recorded for down payments taken at creation
    pub const DOWN_PAYMENT_METHOD: &'static str = "Initial Down Payment";

    /// A regular payment received now
    #[must_use]
    pub fn new(amount_paid: Money, payment_method: impl Into<String>) -> Self {
        Self {
            amount_paid,
            payment_method: payment_method.into(),
            payment_date: None,
            proof_of_payment: None,
            is_downpayment: false,
        }
    }

    /// A down payment taken when the event is booked
    #[must_use]
    pub fn down_payment(amount_paid: Money) -> Self {
        Self {
            is_downpayment: true,
            ..Self::new(amount_paid, Self::DOWN_PAYMENT_METHOD)
        }
    }

    /// Attaches a proof-of-payment reference
    #[must_use]
    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.proof_of_payment = Some(proof.into());
        self
    }

    /// Sets an explicit payment date
    #[must_use]
    pub const fn paid_at(mut self, date: DateTime<Utc>) -> Self {
        self.payment_date = Some(date);
        self
    }

    /// Stamps the payment, defaulting its date to `now`
    #[must_use]
    pub fn into_payment(self, now: DateTime<Utc>) -> Payment {
        Payment {
            amount_paid: self.amount_paid,
            payment_date: self.payment_date.unwrap_or(now),
            payment_method: self.payment_method,
            proof_of_payment: self.proof_of_payment,
            is_downpayment: self.is_downpayment,
        }
    }
}

/// Manually negotiated total that replaces the sum of line items
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountOverride {
    /// Amount before discount
    pub subtotal: Money,
    /// Amount taken off the subtotal
    pub discount_amount: Money,
    /// Informational rate the discount was negotiated at
    pub discount_percentage: Percentage,
}

impl DiscountOverride {
    /// `subtotal − discount_amount`
    #[must_use]
    pub fn total(&self) -> Money {
        self.subtotal - self.discount_amount
    }

    /// Checks that the override describes a non-negative total
    ///
    /// # Errors
    ///
    /// Returns a human readable reason when the override is not acceptable.
    pub fn validate(&self) -> Result<(), String> {
        if self.subtotal.is_negative() || self.discount_amount.is_negative() {
            return Err("discount amounts cannot be negative".to_string());
        }
        if self.discount_amount > self.subtotal {
            return Err(format!(
                "discount {} exceeds subtotal {}",
                self.discount_amount, self.subtotal
            ));
        }
        Ok(())
    }
}

/// Payment status of an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    /// Balance outstanding (or nothing ordered yet)
    #[default]
    Pending,
    /// Payments cover the total
    FullyPaid,
    /// Cancelled by the shop; terminal
    Cancelled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::FullyPaid => write!(f, "Fully Paid"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Derives the status for a total and remaining balance.
///
/// `Cancelled` is sticky, and a zero total keeps whatever status the
/// event already had.
#[must_use]
pub fn derive_status(current: EventStatus, total: Money, remaining: Money) -> EventStatus {
    if current == EventStatus::Cancelled || !total.is_positive() {
        return current;
    }
    if remaining.is_positive() {
        EventStatus::Pending
    } else {
        EventStatus::FullyPaid
    }
}

/// Product and quantity moved in or out of inventory
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockLine {
    /// Catalog product
    pub product_id: ProductId,
    /// Units
    pub quantity: u32,
}

impl StockLine {
    /// Creates a new stock line
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Aggregates line items per product, keeping first-appearance order
#[must_use]
pub fn stock_lines(products: &[LineItem]) -> Vec<StockLine> {
    let mut lines: Vec<StockLine> = Vec::new();
    for item in products {
        add_stock(&mut lines, &item.product_id, item.quantity);
    }
    lines
}

fn add_stock(lines: &mut Vec<StockLine>, product_id: &ProductId, quantity: u32) {
    if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
        line.quantity = line.quantity.saturating_add(quantity);
    } else {
        lines.push(StockLine::new(product_id.clone(), quantity));
    }
}

/// Descriptive fields of an event; no invariants beyond presence
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetails {
    /// Customer the event is for
    pub customer_name: String,
    /// Delivery or venue address
    pub address: String,
    /// Contact number
    pub phone: String,
    /// Occasion, e.g. "Wedding"
    pub event_type: String,
    /// Free-form notes for the florists
    pub notes: String,
    /// When the event takes place
    pub event_date: DateTime<Utc>,
}

/// A customer order for a scheduled occasion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Immutable identifier
    pub id: EventId,
    /// Descriptive fields
    #[serde(flatten)]
    pub details: EventDetails,
    /// Products, replaced wholesale on update
    pub products: Vec<LineItem>,
    payment_history: Vec<Payment>,
    /// Active manual total, if any
    pub discount: Option<DiscountOverride>,
    /// Derived: override total or sum of line items
    pub total_amount: Money,
    /// Derived: sum of all payments
    pub total_paid: Money,
    /// Derived: `total_amount − total_paid`
    pub remaining_balance: Money,
    /// Derived, except `Cancelled` which is set explicitly
    pub status: EventStatus,
    deducted_items: Vec<StockLine>,
    /// Revision in the repository
    pub version: Version,
    /// When the event was booked
    pub created_at: DateTime<Utc>,
    /// Last change
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Creates a pending event and derives its balances
    #[must_use]
    pub fn new(
        id: EventId,
        details: EventDetails,
        products: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut event = Self {
            id,
            details,
            products,
            payment_history: Vec::new(),
            discount: None,
            total_amount: Money::ZERO,
            total_paid: Money::ZERO,
            remaining_balance: Money::ZERO,
            status: EventStatus::Pending,
            deducted_items: Vec::new(),
            version: Version::INITIAL,
            created_at: now,
            updated_at: now,
        };
        event.recompute();
        event
    }

    /// Full payment history, oldest first
    #[must_use]
    pub fn payments(&self) -> &[Payment] {
        &self.payment_history
    }

    /// Stock deducted for this event and not yet restored
    #[must_use]
    pub fn deducted_items(&self) -> &[StockLine] {
        &self.deducted_items
    }

    /// Appends a payment; callers validate the amount first
    pub(crate) fn record_payment(&mut self, payment: Payment) {
        self.payment_history.push(payment);
    }

    /// Sum of quantity × price over the current products
    #[must_use]
    pub fn line_item_total(&self) -> Money {
        self.products.iter().map(LineItem::total).sum()
    }

    /// Re-derives totals and status from products, payments and discount
    pub fn recompute(&mut self) {
        self.total_amount = self
            .discount
            .as_ref()
            .map_or_else(|| self.line_item_total(), DiscountOverride::total);
        self.total_paid = self.payment_history.iter().map(|p| p.amount_paid).sum();
        self.remaining_balance = self.total_amount - self.total_paid;
        self.status = derive_status(self.status, self.total_amount, self.remaining_balance);
    }

    /// Product quantities not covered by an earlier deduction
    #[must_use]
    pub fn outstanding_stock(&self) -> Vec<StockLine> {
        stock_lines(&self.products)
            .into_iter()
            .filter_map(|line| {
                let already = self
                    .deducted_items
                    .iter()
                    .find(|d| d.product_id == line.product_id)
                    .map_or(0, |d| d.quantity);
                let remaining = line.quantity.saturating_sub(already);
                (remaining > 0).then(|| StockLine::new(line.product_id, remaining))
            })
            .collect()
    }

    /// Adds successfully deducted stock to the snapshot
    pub(crate) fn record_deduction(&mut self, lines: &[StockLine]) {
        for line in lines {
            add_stock(&mut self.deducted_items, &line.product_id, line.quantity);
        }
    }

    /// Removes restored stock from the snapshot
    pub(crate) fn release_deduction(&mut self, lines: &[StockLine]) {
        for line in lines {
            if let Some(held) = self
                .deducted_items
                .iter_mut()
                .find(|d| d.product_id == line.product_id)
            {
                held.quantity = held.quantity.saturating_sub(line.quantity);
            }
        }
        self.deducted_items.retain(|d| d.quantity > 0);
    }
}
