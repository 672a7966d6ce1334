use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::order_service::{
    Checkout, OrderPage, OrderQuery, OrderService, OrderStats, SweepReport,
};
use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::order::{Address, Order};
use crate::domain::status::OrderStatus;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    #[validate(length(min = 1, max = 255))]
    pub street: String,
    #[validate(length(min = 1, max = 255))]
    pub city: String,
    #[validate(length(min = 1, max = 50))]
    pub zip_code: String,
}

impl From<&Address> for AddressDto {
    fn from(a: &Address) -> Self {
        Self {
            street: a.street.clone(),
            city: a.city.clone(),
            zip_code: a.zip_code.clone(),
        }
    }
}

impl From<AddressDto> for Address {
    fn from(a: AddressDto) -> Self {
        Self {
            street: a.street,
            city: a.city,
            zip_code: a.zip_code,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    #[validate(length(min = 1, max = 255))]
    pub product_id: String,
    #[validate(length(min = 1, max = 255))]
    pub seller_id: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99".
    /// Must equal the catalog price.
    pub unit_price: String,
    #[validate(range(min = 1, max = 1000000))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_id: String,
    #[validate(length(min = 1, max = 100))]
    pub payment_method: String,
    /// Defaults to the customer's profile address.
    #[validate]
    pub shipping_address: Option<AddressDto>,
    #[validate]
    #[serde(default)]
    pub lines: Vec<CartLineRequest>,
}

impl CreateOrderRequest {
    fn into_checkout(self) -> Result<Checkout, DomainError> {
        let lines = self
            .lines
            .into_iter()
            .map(|l| {
                let price = BigDecimal::from_str(l.unit_price.trim()).map_err(|e| {
                    DomainError::InvalidInput(format!("Invalid unitPrice '{}': {}", l.unit_price, e))
                })?;
                CartLine::new(l.product_id, l.seller_id, price, l.quantity)
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Checkout {
            customer_id: self.customer_id,
            payment_method: self.payment_method,
            shipping_address: self.shipping_address.map(Address::from),
            lines,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
    pub notes: Option<String>,
    /// Reject the change unless the order is still in this status.
    pub expected_status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntryResponse {
    pub status: String,
    pub timestamp: String,
    pub notes: Option<String>,
    /// `checkout`, `manual` or `sweep`.
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub seller_id: String,
    pub line_items: Vec<LineItemResponse>,
    pub subtotal: String,
    pub shipping: String,
    pub total_price: String,
    pub payment_method: String,
    pub shipping_address: AddressDto,
    pub order_date: String,
    pub status: String,
    pub status_history: Vec<StatusEntryResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id(),
            customer_id: o.customer_id().to_string(),
            customer_name: o.customer_name().to_string(),
            customer_email: o.customer_email().to_string(),
            seller_id: o.seller_id().to_string(),
            line_items: o
                .line_items()
                .iter()
                .map(|l| LineItemResponse {
                    product_id: l.product_id.clone(),
                    product_name: l.product_name.clone(),
                    unit_price: l.unit_price.to_string(),
                    quantity: l.quantity,
                    line_total: l.line_total.to_string(),
                })
                .collect(),
            subtotal: o.subtotal().to_string(),
            shipping: o.shipping().to_string(),
            total_price: o.total_price().to_string(),
            payment_method: o.payment_method().to_string(),
            shipping_address: AddressDto::from(o.shipping_address()),
            order_date: o.order_date().to_rfc3339(),
            status: o.status().to_string(),
            status_history: o
                .status_history()
                .iter()
                .map(|e| StatusEntryResponse {
                    status: e.status.to_string(),
                    timestamp: e.timestamp.to_rfc3339(),
                    notes: e.notes.clone(),
                    source: e.source.to_string(),
                })
                .collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersParams {
    pub customer_id: Option<String>,
    pub seller_id: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub search: Option<String>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl ListOrdersParams {
    fn into_query(self) -> Result<OrderQuery, DomainError> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(OrderStatus::from_str)
            .transpose()?;
        Ok(OrderQuery {
            customer_id: non_blank(self.customer_id),
            seller_id: non_blank(self.seller_id),
            status,
            payment_method: non_blank(self.payment_method),
            search: non_blank(self.search),
            page: usize::try_from(self.page.max(1)).unwrap_or(1),
            limit: usize::try_from(self.limit.clamp(1, 100)).unwrap_or(20),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl From<OrderPage> for ListOrdersResponse {
    fn from(p: OrderPage) -> Self {
        Self {
            items: p.items.iter().map(OrderResponse::from).collect(),
            total: p.total,
            page: p.page,
            limit: p.limit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub seller_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// Sum of totals over orders that were not cancelled.
    pub revenue: String,
}

impl From<OrderStats> for StatsResponse {
    fn from(s: OrderStats) -> Self {
        Self {
            total: s.total,
            pending: s.pending,
            processing: s.processing,
            shipped: s.shipped,
            delivered: s.delivered,
            cancelled: s.cancelled,
            revenue: s.revenue.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    pub promoted: Vec<Uuid>,
    pub conflicts: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(r: SweepReport) -> Self {
        Self {
            promoted: r.promoted,
            conflicts: r.conflicts,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Checks out a cart: one Pending order is created per seller in the cart.
/// Nothing is stored unless every seller group is valid.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Orders created, one per seller", body = Vec<OrderResponse>),
        (status = 400, description = "Empty cart, unknown customer or product, invalid payment method"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()?;
    let checkout = body.into_checkout()?;

    let orders = web::block(move || service.place_order(checkout)).await??;

    let body: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Created().json(body))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.get_order(order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// GET /orders
///
/// Newest orders first. `customerId` or `sellerId` narrow the listing through
/// the store's indices before the remaining filters and pagination apply.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("customerId" = Option<String>, Query, description = "Only this customer's orders"),
        ("sellerId" = Option<String>, Query, description = "Only this seller's orders"),
        ("status" = Option<String>, Query, description = "Pending, Processing, Shipped, Delivered or Cancelled"),
        ("paymentMethod" = Option<String>, Query, description = "Case-insensitive payment method"),
        ("search" = Option<String>, Query, description = "Substring of order id, customer name or email"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<OrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner().into_query()?;

    let page = web::block(move || service.list_orders(&query)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::from(page)))
}

/// PATCH /orders/{id}/status
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Unknown status name"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Illegal transition or concurrent change"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    body.validate()?;
    let to = OrderStatus::from_str(&body.status)?;
    let expected = body
        .expected_status
        .as_deref()
        .map(OrderStatus::from_str)
        .transpose()?;

    let order =
        web::block(move || service.transition(order_id, to, body.notes, expected)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// GET /orders/stats
#[utoipa::path(
    get,
    path = "/orders/stats",
    params(
        ("sellerId" = Option<String>, Query, description = "Restrict to one seller"),
    ),
    responses(
        (status = 200, description = "Order counts and revenue", body = StatsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn order_stats(
    service: web::Data<OrderService>,
    query: web::Query<StatsParams>,
) -> Result<HttpResponse, AppError> {
    let seller_id = non_blank(query.into_inner().seller_id);

    let stats = web::block(move || service.stats(seller_id.as_deref())).await??;

    Ok(HttpResponse::Ok().json(StatsResponse::from(stats)))
}

/// POST /orders/sweep
///
/// Runs the stale-order promotion immediately.
#[utoipa::path(
    post,
    path = "/orders/sweep",
    responses(
        (status = 200, description = "Ids promoted to Delivered", body = SweepResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn sweep(service: web::Data<OrderService>) -> Result<HttpResponse, AppError> {
    let report = web::block(move || service.sweep()).await??;

    Ok(HttpResponse::Ok().json(SweepResponse::from(report)))
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
