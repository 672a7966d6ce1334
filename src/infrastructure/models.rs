use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Address, LineItem, Order, OrderRecord, StatusEntry};
use crate::schema::{order_lines, order_status_history, orders};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub seller_id: String,
    pub payment_method: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub subtotal: BigDecimal,
    pub shipping: BigDecimal,
    pub total_price: BigDecimal,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub seller_id: String,
    pub payment_method: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub subtotal: BigDecimal,
    pub shipping: BigDecimal,
    pub total_price: BigDecimal,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_status_history)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusHistoryRow {
    pub id: i64,
    pub order_id: Uuid,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub source: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_status_history)]
pub struct NewStatusHistoryRow {
    pub order_id: Uuid,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub source: String,
}

impl NewStatusHistoryRow {
    pub fn from_entry(order_id: Uuid, entry: &StatusEntry) -> Self {
        Self {
            order_id,
            status: entry.status.to_string(),
            recorded_at: entry.timestamp,
            notes: entry.notes.clone(),
            source: entry.source.to_string(),
        }
    }
}

/// Flatten an order into its three tables.
pub fn order_rows(
    order: &Order,
) -> Result<(NewOrderRow, Vec<NewOrderLineRow>, Vec<NewStatusHistoryRow>), DomainError> {
    let address = order.shipping_address();
    let head = NewOrderRow {
        id: order.id(),
        customer_id: order.customer_id().to_string(),
        customer_name: order.customer_name().to_string(),
        customer_email: order.customer_email().to_string(),
        seller_id: order.seller_id().to_string(),
        payment_method: order.payment_method().to_string(),
        street: address.street.clone(),
        city: address.city.clone(),
        zip_code: address.zip_code.clone(),
        subtotal: order.subtotal().clone(),
        shipping: order.shipping().clone(),
        total_price: order.total_price().clone(),
        status: order.status().to_string(),
        order_date: order.order_date(),
        updated_at: order
            .status_history()
            .last()
            .map(|e| e.timestamp)
            .unwrap_or_else(|| order.order_date()),
    };

    let lines = order
        .line_items()
        .iter()
        .enumerate()
        .map(|(position, item)| {
            Ok(NewOrderLineRow {
                id: Uuid::new_v4(),
                order_id: order.id(),
                position: i32::try_from(position)
                    .map_err(|_| DomainError::InvalidInput("too many line items".into()))?,
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                unit_price: item.unit_price.clone(),
                quantity: i32::try_from(item.quantity)
                    .map_err(|_| DomainError::InvalidInput("quantity out of range".into()))?,
                line_total: item.line_total.clone(),
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    let history = order
        .status_history()
        .iter()
        .map(|entry| NewStatusHistoryRow::from_entry(order.id(), entry))
        .collect();

    Ok((head, lines, history))
}

impl OrderRow {
    /// Reassemble the domain order; `lines` and `history` must already be
    /// in position / insertion order.
    pub fn into_order(
        self,
        lines: Vec<OrderLineRow>,
        history: Vec<StatusHistoryRow>,
    ) -> Result<Order, DomainError> {
        let line_items = lines
            .into_iter()
            .map(|l| {
                Ok(LineItem {
                    product_id: l.product_id,
                    product_name: l.product_name,
                    unit_price: l.unit_price,
                    quantity: u32::try_from(l.quantity).map_err(|_| {
                        DomainError::InvalidInput(format!("negative quantity on line {}", l.id))
                    })?,
                    line_total: l.line_total,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let status_history = history
            .into_iter()
            .map(|h| {
                Ok(StatusEntry {
                    status: h.status.parse()?,
                    timestamp: h.recorded_at,
                    notes: h.notes,
                    source: h.source.parse()?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Order::restore(OrderRecord {
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            seller_id: self.seller_id,
            line_items,
            subtotal: self.subtotal,
            shipping: self.shipping,
            total_price: self.total_price,
            payment_method: self.payment_method,
            shipping_address: Address {
                street: self.street,
                city: self.city,
                zip_code: self.zip_code,
            },
            order_date: self.order_date,
            status: self.status.parse()?,
            status_history,
        })
    }
}
