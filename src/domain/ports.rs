use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{Address, Order, StatusChange};
use super::status::OrderStatus;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Address,
    #[serde(default)]
    pub payment_methods: Vec<String>,
}

impl Customer {
    /// Match `requested` against the registered payment methods, ignoring
    /// case, and return the registered spelling.
    pub fn resolve_payment_method(&self, requested: &str) -> Result<&str, DomainError> {
        let requested = requested.trim();
        self.payment_methods
            .iter()
            .find(|m| !requested.is_empty() && m.trim().eq_ignore_ascii_case(requested))
            .map(|m| m.as_str())
            .ok_or_else(|| DomainError::InvalidPaymentMethod(requested.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub stock: u32,
}

pub trait CustomerDirectory: Send + Sync + 'static {
    fn customer(&self, id: &str) -> Result<Option<Customer>, DomainError>;
}

pub trait ProductCatalog: Send + Sync + 'static {
    fn product(&self, id: &str) -> Result<Option<Product>, DomainError>;
}

/// Authoritative order storage with customer and seller indices.
///
/// `put_all` and `apply_status_change` are the only write paths. Query
/// results are ordered most recent first, ties broken by ascending order id.
pub trait OrderStore: Send + Sync + 'static {
    /// Insert new orders all or nothing; `DuplicateOrderId` if any id is
    /// taken, including twice within `orders`.
    fn put_all(&self, orders: Vec<Order>) -> Result<(), DomainError>;

    fn put(&self, order: Order) -> Result<(), DomainError> {
        self.put_all(vec![order])
    }

    fn get(&self, id: Uuid) -> Result<Order, DomainError>;
    fn query_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, DomainError>;
    fn query_by_seller(&self, seller_id: &str) -> Result<Vec<Order>, DomainError>;
    fn all(&self) -> Result<Vec<Order>, DomainError>;
    fn with_status(&self, status: OrderStatus) -> Result<Vec<Order>, DomainError>;
    /// Compare-and-swap: applies `change` only if the stored status still
    /// equals `change.from()`, otherwise `Conflict`. Returns the updated
    /// order.
    fn apply_status_change(&self, change: &StatusChange) -> Result<Order, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(methods: &[&str]) -> Customer {
        Customer {
            id: "C1".into(),
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            address: Address {
                street: "1 Main St".into(),
                city: "Cairo".into(),
                zip_code: "11511".into(),
            },
            payment_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn payment_method_matches_ignoring_case() {
        let c = customer(&["PayPal", "Credit Card"]);
        assert_eq!(c.resolve_payment_method("paypal").unwrap(), "PayPal");
        assert_eq!(c.resolve_payment_method(" credit card ").unwrap(), "Credit Card");
    }

    #[test]
    fn unregistered_payment_method_is_rejected() {
        let c = customer(&["PayPal"]);
        assert!(matches!(
            c.resolve_payment_method("Bitcoin"),
            Err(DomainError::InvalidPaymentMethod(_))
        ));
        assert!(customer(&[]).resolve_payment_method("PayPal").is_err());
        assert!(c.resolve_payment_method("").is_err());
    }

    #[test]
    fn customer_deserializes_from_seed_json() {
        let c: Customer = serde_json::from_str(
            r#"{"id":"C1","name":"Jane Doe","email":"jane@example.com",
                "address":{"street":"1 Main St","city":"Cairo","zipCode":"11511"}}"#,
        )
        .unwrap();
        assert!(c.payment_methods.is_empty());
        assert_eq!(c.address.zip_code, "11511");
    }
}
