use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::status::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip_code: String,
}

/// Snapshot of a purchased product, frozen at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: BigDecimal,
    pub quantity: u32,
    pub line_total: BigDecimal,
}

/// Who recorded a status history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Checkout,
    Manual,
    Sweep,
}

impl ChangeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSource::Checkout => "checkout",
            ChangeSource::Manual => "manual",
            ChangeSource::Sweep => "sweep",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ChangeSource::Checkout, ChangeSource::Manual, ChangeSource::Sweep]
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown change source '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
    pub source: ChangeSource,
}

/// A validated, not yet applied status change.
///
/// Only [`Order`] can produce one, so every status write goes through the
/// state machine (or the stale-order rule) and always carries its history
/// entry. Stores apply it with a compare-and-swap on `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    order_id: Uuid,
    from: OrderStatus,
    entry: StatusEntry,
}

impl StatusChange {
    pub fn order_id(&self) -> Uuid {
        self.order_id
    }

    pub fn from(&self) -> OrderStatus {
        self.from
    }

    pub fn to(&self) -> OrderStatus {
        self.entry.status
    }

    pub fn entry(&self) -> &StatusEntry {
        &self.entry
    }
}

/// An order placed with a single seller.
///
/// Line items, totals and the shipping address are fixed at creation; the
/// only mutation is [`Order::apply`], which appends to the status history.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: Uuid,
    customer_id: String,
    customer_name: String,
    customer_email: String,
    seller_id: String,
    line_items: Vec<LineItem>,
    subtotal: BigDecimal,
    shipping: BigDecimal,
    total_price: BigDecimal,
    payment_method: String,
    shipping_address: Address,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    status_history: Vec<StatusEntry>,
}

/// Every stored field of an order, used to rebuild one at a persistence
/// boundary. [`Order::restore`] validates it.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub seller_id: String,
    pub line_items: Vec<LineItem>,
    pub subtotal: BigDecimal,
    pub shipping: BigDecimal,
    pub total_price: BigDecimal,
    pub payment_method: String,
    pub shipping_address: Address,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub status_history: Vec<StatusEntry>,
}

pub(crate) struct NewOrder {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub seller_id: String,
    pub line_items: Vec<LineItem>,
    pub shipping: BigDecimal,
    pub payment_method: String,
    pub shipping_address: Address,
    pub order_date: DateTime<Utc>,
}

impl Order {
    pub(crate) fn pending(new: NewOrder) -> Self {
        let subtotal = sum_line_totals(&new.line_items);
        let total_price = &subtotal + &new.shipping;
        Self {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            seller_id: new.seller_id,
            line_items: new.line_items,
            subtotal,
            shipping: new.shipping,
            total_price,
            payment_method: new.payment_method,
            shipping_address: new.shipping_address,
            order_date: new.order_date,
            status: OrderStatus::Pending,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                timestamp: new.order_date,
                notes: None,
                source: ChangeSource::Checkout,
            }],
        }
    }

    /// Rebuild an order from stored data, rejecting records that break the
    /// order invariants instead of patching them up.
    pub fn restore(record: OrderRecord) -> Result<Self, DomainError> {
        let id = record.id;
        let invalid = move |msg: &str| DomainError::InvalidInput(format!("order {}: {}", id, msg));

        if record.line_items.is_empty() {
            return Err(invalid("no line items"));
        }
        for item in &record.line_items {
            if &item.unit_price * BigDecimal::from(item.quantity) != item.line_total {
                return Err(invalid("line total does not match price x quantity"));
            }
        }
        let subtotal = sum_line_totals(&record.line_items);
        if subtotal != record.subtotal {
            return Err(invalid("subtotal does not match line items"));
        }
        if &subtotal + &record.shipping != record.total_price {
            return Err(invalid("total price does not match subtotal + shipping"));
        }
        match (record.status_history.first(), record.status_history.last()) {
            (Some(first), Some(last)) => {
                if first.status != OrderStatus::Pending {
                    return Err(invalid("history does not start at Pending"));
                }
                if last.status != record.status {
                    return Err(invalid("status does not match last history entry"));
                }
            }
            _ => return Err(invalid("empty status history")),
        }

        Ok(Self {
            id: record.id,
            customer_id: record.customer_id,
            customer_name: record.customer_name,
            customer_email: record.customer_email,
            seller_id: record.seller_id,
            line_items: record.line_items,
            subtotal: record.subtotal,
            shipping: record.shipping,
            total_price: record.total_price,
            payment_method: record.payment_method,
            shipping_address: record.shipping_address,
            order_date: record.order_date,
            status: record.status,
            status_history: record.status_history,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }
    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }
    pub fn seller_id(&self) -> &str {
        &self.seller_id
    }
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }
    pub fn subtotal(&self) -> &BigDecimal {
        &self.subtotal
    }
    pub fn shipping(&self) -> &BigDecimal {
        &self.shipping
    }
    pub fn total_price(&self) -> &BigDecimal {
        &self.total_price
    }
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }
    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }
    pub fn status(&self) -> OrderStatus {
        self.status
    }
    pub fn status_history(&self) -> &[StatusEntry] {
        &self.status_history
    }

    /// The status a sweep promoted this order from, while that promotion is
    /// still the latest history entry.
    pub fn auto_delivered_from(&self) -> Option<OrderStatus> {
        match self.status_history.as_slice() {
            [.., before, last]
                if self.status == OrderStatus::Delivered
                    && last.source == ChangeSource::Sweep =>
            {
                Some(before.status)
            }
            _ => None,
        }
    }

    /// Whether the order is in `expected`, counting an auto-delivered order
    /// as still being in the status it was promoted from.
    pub fn is_in(&self, expected: OrderStatus) -> bool {
        self.status == expected || self.auto_delivered_from() == Some(expected)
    }

    /// Validate a manual transition against the state machine.
    ///
    /// A manual transition overrides an auto-delivery: it is checked against
    /// the status the sweep promoted from and replaces the Delivered entry's
    /// effect.
    pub fn plan_transition(
        &self,
        to: OrderStatus,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, DomainError> {
        if let Err(illegal) = self.status.ensure_transition(to) {
            match self.auto_delivered_from() {
                Some(before) if before.can_transition_to(to) => {}
                _ => return Err(illegal),
            }
        }
        Ok(self.change_to(to, notes, at, ChangeSource::Manual))
    }

    /// The stale-order rule: a Pending order older than `grace` is promoted
    /// straight to Delivered. `None` when the rule does not apply.
    pub fn plan_auto_delivery(
        &self,
        now: DateTime<Utc>,
        grace: chrono::Duration,
    ) -> Option<StatusChange> {
        if self.status != OrderStatus::Pending || now - self.order_date <= grace {
            return None;
        }
        Some(self.change_to(
            OrderStatus::Delivered,
            Some("auto-delivered after grace period".to_string()),
            now,
            ChangeSource::Sweep,
        ))
    }

    /// Apply a planned change if the order is still in the status the change
    /// was planned from.
    pub fn apply(&mut self, change: &StatusChange) -> Result<(), DomainError> {
        if change.order_id != self.id {
            return Err(DomainError::Internal(format!(
                "status change for {} applied to {}",
                change.order_id, self.id
            )));
        }
        if self.status != change.from {
            return Err(DomainError::Conflict {
                expected: change.from,
                actual: self.status,
            });
        }
        self.status_history.push(change.entry.clone());
        self.status = change.entry.status;
        Ok(())
    }

    fn change_to(
        &self,
        to: OrderStatus,
        notes: Option<String>,
        at: DateTime<Utc>,
        source: ChangeSource,
    ) -> StatusChange {
        StatusChange {
            order_id: self.id,
            from: self.status,
            entry: StatusEntry {
                status: to,
                timestamp: at,
                notes: notes.filter(|n| !n.trim().is_empty()),
                source,
            },
        }
    }
}

fn sum_line_totals(items: &[LineItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0u32), |acc, item| acc + &item.line_total)
}

/// Most recent first; ties broken by ascending id.
pub fn newest_first(a: &Order, b: &Order) -> Ordering {
    b.order_date
        .cmp(&a.order_date)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::str::FromStr;

    pub fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    pub fn address() -> Address {
        Address {
            street: "1 Main St".into(),
            city: "Cairo".into(),
            zip_code: "11511".into(),
        }
    }

    pub fn pending_order(customer: &str, seller: &str, at: DateTime<Utc>) -> Order {
        Order::pending(NewOrder {
            customer_id: customer.into(),
            customer_name: "Jane Doe".into(),
            customer_email: "jane@example.com".into(),
            seller_id: seller.into(),
            line_items: vec![LineItem {
                product_id: "P1".into(),
                product_name: "Widget".into(),
                unit_price: dec("10"),
                quantity: 2,
                line_total: dec("20"),
            }],
            shipping: dec("5"),
            payment_method: "Card".into(),
            shipping_address: address(),
            order_date: at,
        })
    }
}
