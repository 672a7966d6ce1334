use std::collections::HashMap;

use bigdecimal::BigDecimal;

use super::errors::DomainError;

/// Largest quantity a single cart line may ask for.
pub const MAX_QUANTITY: u32 = 1_000_000;
/// Longest product or seller id, in characters.
pub const MAX_ID_LEN: usize = 255;

/// `InvalidInput` when `value` is longer than `max` characters.
pub(crate) fn ensure_max_len(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// One line of the active checkout cart. Discarded once orders are placed.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    product_id: String,
    seller_id: String,
    unit_price: BigDecimal,
    quantity: u32,
}

impl CartLine {
    pub fn new(
        product_id: impl Into<String>,
        seller_id: impl Into<String>,
        unit_price: BigDecimal,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        let product_id = product_id.into().trim().to_string();
        let seller_id = seller_id.into().trim().to_string();
        if product_id.is_empty() {
            return Err(DomainError::InvalidInput("product_id must not be blank".into()));
        }
        if seller_id.is_empty() {
            return Err(DomainError::InvalidInput("seller_id must not be blank".into()));
        }
        ensure_max_len("product_id", &product_id, MAX_ID_LEN)?;
        ensure_max_len("seller_id", &seller_id, MAX_ID_LEN)?;
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(DomainError::InvalidInput(format!(
                "quantity for product '{}' must be between 1 and {}",
                product_id, MAX_QUANTITY
            )));
        }
        if unit_price < BigDecimal::from(0u32) {
            return Err(DomainError::InvalidInput(format!(
                "unit_price for product '{}' must not be negative",
                product_id
            )));
        }
        Ok(Self {
            product_id,
            seller_id,
            unit_price,
            quantity,
        })
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn seller_id(&self) -> &str {
        &self.seller_id
    }

    pub fn unit_price(&self) -> &BigDecimal {
        &self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// Flat-fee shipping that is waived once a seller group's subtotal is
/// strictly above the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingPolicy {
    pub free_threshold: BigDecimal,
    pub flat_fee: BigDecimal,
}

impl ShippingPolicy {
    pub fn new(free_threshold: BigDecimal, flat_fee: BigDecimal) -> Self {
        Self {
            free_threshold,
            flat_fee,
        }
    }

    pub fn shipping_for(&self, subtotal: &BigDecimal) -> BigDecimal {
        if subtotal > &self.free_threshold {
            BigDecimal::from(0u32)
        } else {
            self.flat_fee.clone()
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::new(BigDecimal::from(100u32), BigDecimal::from(10u32))
    }
}

/// The lines of one seller, checked out as an independent order.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerCartGroup {
    pub seller_id: String,
    pub lines: Vec<CartLine>,
    pub subtotal: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
}

/// Partition `lines` into one group per seller.
///
/// Groups come back in the order each seller first appears in the cart.
/// An empty cart yields no groups.
pub fn group_by_seller(lines: &[CartLine], policy: &ShippingPolicy) -> Vec<SellerCartGroup> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<CartLine>)> = Vec::new();

    for line in lines {
        let slot = *slots.entry(line.seller_id()).or_insert_with(|| {
            buckets.push((line.seller_id().to_string(), Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(line.clone());
    }

    buckets
        .into_iter()
        .map(|(seller_id, lines)| {
            let subtotal = lines
                .iter()
                .fold(BigDecimal::from(0u32), |acc, l| acc + l.line_total());
            let shipping = policy.shipping_for(&subtotal);
            let total = &subtotal + &shipping;
            SellerCartGroup {
                seller_id,
                lines,
                subtotal,
                shipping,
                total,
            }
        })
        .collect()
}
