pub mod application;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::order_service::OrderService;
use crate::config::{Config, ConfigError};
use crate::domain::ports::OrderStore;
use crate::infrastructure::directory::{InMemoryDirectory, SeedError};
use crate::infrastructure::memory_store::InMemoryOrderStore;
use crate::infrastructure::order_repo::DieselOrderStore;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("Failed to connect to the database: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Failed to run database migrations: {0}")]
    Migration(String),
}

impl From<StartupError> for std::io::Error {
    fn from(e: StartupError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    }
}

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), StartupError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migration(e.to_string()))?;
    Ok(())
}

/// Wire the order service from configuration: PostgreSQL when a database URL
/// is configured, the in-memory store otherwise.
pub fn build_service(config: &Config) -> Result<OrderService, StartupError> {
    let directory = match &config.seed_path {
        Some(path) => InMemoryDirectory::from_seed_file(path)?,
        None => InMemoryDirectory::new(),
    };
    log::info!(
        "directory loaded with {} customer(s) and {} product(s)",
        directory.customer_count(),
        directory.product_count()
    );

    let store: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url)?;
            run_migrations(&pool)?;
            log::info!("orders are stored in PostgreSQL");
            Arc::new(DieselOrderStore::new(pool))
        }
        None => {
            log::warn!("DATABASE_URL not set; orders are kept in memory only");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let directory = Arc::new(directory);
    Ok(OrderService::new(store, directory.clone(), directory)
        .with_shipping(config.shipping.clone())
        .with_grace_period(config.grace_period))
}

/// Route table plus the shared service, for use with `App::configure`.
pub fn configure_app(service: web::Data<OrderService>) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(service.clone());
        handlers::configure(cfg);
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: web::Data<OrderService>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = handlers::ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure_app(service.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
