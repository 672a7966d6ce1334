use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::cart::{ensure_max_len, CartLine, SellerCartGroup};
use super::errors::DomainError;
use super::order::{Address, LineItem, NewOrder, Order};
use super::ports::{Customer, Product, ProductCatalog};

/// Turns a seller group into a Pending order, snapshotting product names
/// and prices from the catalog view at checkout time.
///
/// Cart prices are never trusted: a line whose unit price differs from the
/// catalog price is a `PriceMismatch`.
pub struct OrderFactory<'a> {
    catalog: &'a dyn ProductCatalog,
}

impl<'a> OrderFactory<'a> {
    pub fn new(catalog: &'a dyn ProductCatalog) -> Self {
        Self { catalog }
    }

    /// Check a whole cart against the catalog before any order is built:
    /// every product exists, every price matches, and the summed quantity
    /// per product fits its stock.
    pub fn check_cart(&self, lines: &[CartLine]) -> Result<(), DomainError> {
        let mut wanted: Vec<(Product, u64)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for line in lines {
            let product = self.priced(line)?;
            let quantity = u64::from(line.quantity());
            match slots.get(line.product_id()) {
                Some(&slot) => wanted[slot].1 += quantity,
                None => {
                    slots.insert(line.product_id(), wanted.len());
                    wanted.push((product, quantity));
                }
            }
        }

        for (product, requested) in wanted {
            if requested > u64::from(product.stock) {
                return Err(DomainError::InsufficientStock {
                    product_id: product.id,
                    requested,
                    available: product.stock,
                });
            }
        }
        Ok(())
    }

    pub fn create_order(
        &self,
        group: &SellerCartGroup,
        customer: &Customer,
        payment_method: &str,
        shipping_address: Option<&Address>,
        now: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        if group.lines.is_empty() {
            return Err(DomainError::EmptyGroup(group.seller_id.clone()));
        }
        let payment_method = customer.resolve_payment_method(payment_method)?;
        if let Some(address) = shipping_address {
            ensure_max_len("street", &address.street, 255)?;
            ensure_max_len("city", &address.city, 255)?;
            ensure_max_len("zip_code", &address.zip_code, 50)?;
        }

        let line_items = group
            .lines
            .iter()
            .map(|line| {
                let product = self.priced(line)?;
                let line_total = &product.price * BigDecimal::from(line.quantity());
                Ok(LineItem {
                    product_id: line.product_id().to_string(),
                    product_name: product.name,
                    unit_price: product.price,
                    quantity: line.quantity(),
                    line_total,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Order::pending(NewOrder {
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            seller_id: group.seller_id.clone(),
            line_items,
            shipping: group.shipping.clone(),
            payment_method: payment_method.to_string(),
            shipping_address: shipping_address.unwrap_or(&customer.address).clone(),
            order_date: now,
        }))
    }

    /// Catalog entry for `line`, provided the cart quotes its current price.
    fn priced(&self, line: &CartLine) -> Result<Product, DomainError> {
        let product = self
            .catalog
            .product(line.product_id())?
            .ok_or_else(|| DomainError::UnknownProduct(line.product_id().to_string()))?;
        if &product.price != line.unit_price() {
            return Err(DomainError::PriceMismatch {
                product_id: product.id,
                expected: product.price,
                actual: line.unit_price().clone(),
            });
        }
        Ok(product)
    }
}
