use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{newest_first, Order, StatusChange};
use crate::domain::ports::OrderStore;
use crate::domain::status::OrderStatus;

/// Sorts most recent first, then by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct IndexKey(Reverse<DateTime<Utc>>, Uuid);

impl IndexKey {
    fn of(order: &Order) -> Self {
        IndexKey(Reverse(order.order_date()), order.id())
    }
}

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    by_customer: HashMap<String, BTreeSet<IndexKey>>,
    by_seller: HashMap<String, BTreeSet<IndexKey>>,
}

impl Inner {
    fn resolve(&self, keys: Option<&BTreeSet<IndexKey>>) -> Vec<Order> {
        keys.into_iter()
            .flatten()
            .filter_map(|key| self.orders.get(&key.1).cloned())
            .collect()
    }
}

/// Process-local order store. One lock guards the orders and both indices,
/// so every write is atomic with respect to readers.
#[derive(Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<Inner>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, DomainError> {
        self.inner
            .read()
            .map_err(|_| DomainError::Internal("order store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, DomainError> {
        self.inner
            .write()
            .map_err(|_| DomainError::Internal("order store lock poisoned".into()))
    }
}

impl OrderStore for InMemoryOrderStore {
    fn put_all(&self, orders: Vec<Order>) -> Result<(), DomainError> {
        let mut inner = self.write()?;
        let mut batch = HashSet::with_capacity(orders.len());
        for order in &orders {
            if inner.orders.contains_key(&order.id()) || !batch.insert(order.id()) {
                return Err(DomainError::DuplicateOrderId(order.id()));
            }
        }
        for order in orders {
            let key = IndexKey::of(&order);
            inner
                .by_customer
                .entry(order.customer_id().to_string())
                .or_default()
                .insert(key);
            inner
                .by_seller
                .entry(order.seller_id().to_string())
                .or_default()
                .insert(key);
            inner.orders.insert(order.id(), order);
        }
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Order, DomainError> {
        self.read()?
            .orders
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn query_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, DomainError> {
        let inner = self.read()?;
        Ok(inner.resolve(inner.by_customer.get(customer_id)))
    }

    fn query_by_seller(&self, seller_id: &str) -> Result<Vec<Order>, DomainError> {
        let inner = self.read()?;
        Ok(inner.resolve(inner.by_seller.get(seller_id)))
    }

    fn all(&self) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self.read()?.orders.values().cloned().collect();
        orders.sort_by(newest_first);
        Ok(orders)
    }

    fn with_status(&self, status: OrderStatus) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.status() == status)
            .cloned()
            .collect();
        orders.sort_by(newest_first);
        Ok(orders)
    }

    fn apply_status_change(&self, change: &StatusChange) -> Result<Order, DomainError> {
        let mut inner = self.write()?;
        let stored = inner
            .orders
            .get_mut(&change.order_id())
            .ok_or(DomainError::NotFound)?;
        stored.apply(change)?;
        Ok(stored.clone())
    }
}
