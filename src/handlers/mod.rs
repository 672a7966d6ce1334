pub mod orders;

use actix_web::web;
use utoipa::OpenApi;

use crate::errors::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        orders::order_stats,
        orders::sweep,
        orders::health,
    ),
    components(schemas(
        orders::AddressDto,
        orders::CartLineRequest,
        orders::CreateOrderRequest,
        orders::UpdateStatusRequest,
        orders::LineItemResponse,
        orders::StatusEntryResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
        orders::StatsResponse,
        orders::SweepResponse,
    )),
    tags(
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Register the HTTP routes. Fixed segments under `/orders` come before
/// `/{id}` so they are not parsed as ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest {
            code: "INVALID_JSON",
            message: err.to_string(),
        }
        .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest {
            code: "INVALID_QUERY",
            message: err.to_string(),
        }
        .into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest {
            code: "INVALID_PATH",
            message: err.to_string(),
        }
        .into()
    }))
    .route("/health", web::get().to(orders::health))
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/stats", web::get().to(orders::order_stats))
            .route("/sweep", web::post().to(orders::sweep))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/status", web::patch().to(orders::update_status)),
    );
}
