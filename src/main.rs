use actix_web::web;
use dotenvy::dotenv;
use order_lifecycle::application::sweeper::spawn_sweeper;
use order_lifecycle::config::Config;
use order_lifecycle::{build_server, build_service, StartupError};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(StartupError::from)?;
    let service = web::Data::new(build_service(&config)?);

    match service.sweep() {
        Ok(report) => log::info!(
            "startup sweep promoted {} stale order(s)",
            report.promoted.len()
        ),
        Err(e) => log::error!("startup sweep failed: {}", e),
    }

    match config.sweep_interval {
        Some(every) => {
            spawn_sweeper(service.clone().into_inner(), every);
            log::info!("stale-order sweep scheduled every {:?}", every);
        }
        None => log::info!("periodic stale-order sweep disabled"),
    }

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(service, &config.host, config.port)?.await
}
