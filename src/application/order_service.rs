use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::domain::cart::{group_by_seller, CartLine, ShippingPolicy};
use crate::domain::errors::DomainError;
use crate::domain::factory::OrderFactory;
use crate::domain::order::{Address, Order};
use crate::domain::ports::{CustomerDirectory, OrderStore, ProductCatalog};
use crate::domain::status::OrderStatus;

/// Everything needed to turn a cart into orders.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub customer_id: String,
    pub payment_method: String,
    /// Falls back to the customer's profile address.
    pub shipping_address: Option<Address>,
    pub lines: Vec<CartLine>,
}

/// Filters and pagination for the order listing.
#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub customer_id: Option<String>,
    pub seller_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_method: Option<String>,
    pub search: Option<String>,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            customer_id: None,
            seller_id: None,
            status: None,
            payment_method: None,
            search: None,
            page: 1,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub promoted: Vec<Uuid>,
    /// Orders that changed under the sweep and were left alone.
    pub conflicts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// Sum of `total_price` over orders that were not cancelled.
    pub revenue: BigDecimal,
}

/// Application façade over the order store and its lookups. Constructed
/// once at startup and shared by every handler and the sweep worker.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    customers: Arc<dyn CustomerDirectory>,
    products: Arc<dyn ProductCatalog>,
    clock: Arc<dyn Clock>,
    shipping: ShippingPolicy,
    grace_period: chrono::Duration,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        customers: Arc<dyn CustomerDirectory>,
        products: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            store,
            customers,
            products,
            clock: Arc::new(SystemClock),
            shipping: ShippingPolicy::default(),
            grace_period: chrono::Duration::hours(48),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_shipping(mut self, shipping: ShippingPolicy) -> Self {
        self.shipping = shipping;
        self
    }

    pub fn with_grace_period(mut self, grace_period: chrono::Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Split the cart per seller and place one Pending order per group.
    ///
    /// The cart is checked against the catalog and every group is built
    /// before anything is written; the orders are then stored all or
    /// nothing.
    pub fn place_order(&self, checkout: Checkout) -> Result<Vec<Order>, DomainError> {
        if checkout.lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        let customer = self
            .customers
            .customer(&checkout.customer_id)?
            .ok_or_else(|| DomainError::UnknownCustomer(checkout.customer_id.clone()))?;

        let factory = OrderFactory::new(self.products.as_ref());
        factory.check_cart(&checkout.lines)?;
        let groups = group_by_seller(&checkout.lines, &self.shipping);

        let now = self.clock.now();
        let orders = groups
            .iter()
            .map(|group| {
                factory.create_order(
                    group,
                    &customer,
                    &checkout.payment_method,
                    checkout.shipping_address.as_ref(),
                    now,
                )
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        self.store.put_all(orders.clone()).map_err(|e| {
            if let DomainError::DuplicateOrderId(id) = &e {
                log::error!("order id collision on {}; refusing to overwrite", id);
            }
            e
        })?;
        for order in &orders {
            log::info!(
                "placed order {} for customer {} with seller {} total {}",
                order.id(),
                order.customer_id(),
                order.seller_id(),
                order.total_price()
            );
        }
        Ok(orders)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.store.get(id)
    }

    pub fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, DomainError> {
        self.store.query_by_customer(customer_id)
    }

    pub fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<Order>, DomainError> {
        self.store.query_by_seller(seller_id)
    }

    pub fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, DomainError> {
        let base = match (&query.customer_id, &query.seller_id) {
            (Some(customer), _) => self.store.query_by_customer(customer)?,
            (None, Some(seller)) => self.store.query_by_seller(seller)?,
            (None, None) => self.store.all()?,
        };
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<Order> = base
            .into_iter()
            .filter(|o| {
                query
                    .seller_id
                    .as_deref()
                    .map_or(true, |s| o.seller_id() == s)
            })
            .filter(|o| query.status.map_or(true, |s| o.status() == s))
            .filter(|o| {
                query
                    .payment_method
                    .as_deref()
                    .map_or(true, |m| o.payment_method().eq_ignore_ascii_case(m.trim()))
            })
            .filter(|o| needle.as_deref().map_or(true, |n| matches_search(o, n)))
            .collect();

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(OrderPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Move an order along the state machine.
    ///
    /// `expected` lets a caller that read the order earlier insist it has
    /// not changed since; the store additionally compares against the
    /// status read here, so a concurrent writer always yields `Conflict`.
    ///
    /// A sweep that auto-delivers the order between the read and the write
    /// does not beat a manual transition: the order is re-read once and the
    /// transition planned again on top of the auto-delivery.
    pub fn transition(
        &self,
        id: Uuid,
        to: OrderStatus,
        notes: Option<String>,
        expected: Option<OrderStatus>,
    ) -> Result<Order, DomainError> {
        let mut overriding_sweep = false;
        loop {
            let order = self.store.get(id)?;
            if let Some(expected) = expected {
                if !order.is_in(expected) {
                    log::warn!(
                        "order {} is {}, caller expected {}",
                        id,
                        order.status(),
                        expected
                    );
                    return Err(DomainError::Conflict {
                        expected,
                        actual: order.status(),
                    });
                }
            }

            let change = order
                .plan_transition(to, notes.clone(), self.clock.now())
                .map_err(|e| {
                    log::warn!("rejected transition on order {}: {}", id, e);
                    e
                })?;

            match self.store.apply_status_change(&change) {
                Ok(updated) => {
                    log::info!("order {} moved {} -> {}", id, change.from(), change.to());
                    return Ok(updated);
                }
                Err(e @ DomainError::Conflict { .. }) if !overriding_sweep => {
                    if self.store.get(id)?.auto_delivered_from().is_none() {
                        log::warn!("transition on order {} failed: {}", id, e);
                        return Err(e);
                    }
                    log::info!(
                        "order {} was auto-delivered concurrently; applying {} over it",
                        id,
                        to
                    );
                    overriding_sweep = true;
                }
                Err(e) => {
                    log::warn!("transition on order {} failed: {}", id, e);
                    return Err(e);
                }
            }
        }
    }

    /// Promote every Pending order older than the grace period to
    /// Delivered. Safe to call repeatedly: promoted orders are no longer
    /// Pending, and an order that changed underneath is skipped.
    pub fn promote_stale_orders(&self, now: DateTime<Utc>) -> Result<SweepReport, DomainError> {
        let mut report = SweepReport::default();

        for order in self.store.with_status(OrderStatus::Pending)? {
            let Some(change) = order.plan_auto_delivery(now, self.grace_period) else {
                continue;
            };
            match self.store.apply_status_change(&change) {
                Ok(_) => report.promoted.push(order.id()),
                Err(DomainError::Conflict { actual, .. }) => {
                    log::warn!(
                        "sweep skipped order {}: changed to {} concurrently",
                        order.id(),
                        actual
                    );
                    report.conflicts += 1;
                }
                Err(DomainError::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }

        if !report.promoted.is_empty() {
            log::info!(
                "sweep promoted {} stale order(s) to Delivered",
                report.promoted.len()
            );
        }
        Ok(report)
    }

    /// [`promote_stale_orders`](Self::promote_stale_orders) at the service
    /// clock's current time.
    pub fn sweep(&self) -> Result<SweepReport, DomainError> {
        self.promote_stale_orders(self.clock.now())
    }

    pub fn stats(&self, seller_id: Option<&str>) -> Result<OrderStats, DomainError> {
        let orders = match seller_id {
            Some(seller) => self.store.query_by_seller(seller)?,
            None => self.store.all()?,
        };

        let mut stats = OrderStats {
            total: orders.len(),
            pending: 0,
            processing: 0,
            shipped: 0,
            delivered: 0,
            cancelled: 0,
            revenue: BigDecimal::from(0u32),
        };
        for order in &orders {
            match order.status() {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            if order.status() != OrderStatus::Cancelled {
                stats.revenue += order.total_price();
            }
        }
        Ok(stats)
    }
}

fn matches_search(order: &Order, needle: &str) -> bool {
    order.id().to_string().contains(needle)
        || order.customer_name().to_lowercase().contains(needle)
        || order.customer_email().to_lowercase().contains(needle)
}
