use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use super::status::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Seller group for '{0}' has no lines")]
    EmptyGroup(String),
    #[error("Payment method '{0}' is not registered for this customer")]
    InvalidPaymentMethod(String),
    #[error("Unknown customer '{0}'")]
    UnknownCustomer(String),
    #[error("Unknown product '{0}'")]
    UnknownProduct(String),
    #[error("Price of '{product_id}' is {expected}, cart says {actual}")]
    PriceMismatch {
        product_id: String,
        expected: BigDecimal,
        actual: BigDecimal,
    },
    #[error("Only {available} of '{product_id}' in stock, {requested} requested")]
    InsufficientStock {
        product_id: String,
        requested: u64,
        available: u32,
    },
    #[error("Duplicate order id {0}")]
    DuplicateOrderId(Uuid),
    #[error("Order not found")]
    NotFound,
    #[error("Illegal status transition {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order status changed concurrently (expected {expected}, found {actual})")]
    Conflict {
        expected: OrderStatus,
        actual: OrderStatus,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::EmptyCart => "EMPTY_CART",
            DomainError::EmptyGroup(_) => "EMPTY_GROUP",
            DomainError::InvalidPaymentMethod(_) => "INVALID_PAYMENT_METHOD",
            DomainError::UnknownCustomer(_) => "UNKNOWN_CUSTOMER",
            DomainError::UnknownProduct(_) => "UNKNOWN_PRODUCT",
            DomainError::PriceMismatch { .. } => "PRICE_MISMATCH",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::DuplicateOrderId(_) => "DUPLICATE_ORDER_ID",
            DomainError::NotFound => "NOT_FOUND",
            DomainError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            DomainError::Conflict { .. } => "CONFLICT",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::Internal(_) => "INTERNAL",
        }
    }
}
