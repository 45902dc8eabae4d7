use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use trademarket_gateway::config::Settings;
use trademarket_gateway::db::metadata_repo::PgMetadataRepository;
use trademarket_gateway::market::Marketplace;
use trademarket_gateway::service::MarketService;
use trademarket_gateway::{http, metrics};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env().context("loading configuration")?;

    // Postgres pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await
        .context("connecting to the metadata store")?;

    let market = Marketplace::new(settings.regions.clone(), settings.upstream_timeout)
        .context("building the market client")?;
    let repo = PgMetadataRepository::new(db_pool);
    let service = web::Data::new(MarketService::new(
        &settings,
        Arc::new(market),
        Arc::new(repo),
    ));

    log::info!(
        "serving {} regions in {} languages on {}",
        settings.regions.codes().count(),
        settings.languages.len(),
        settings.server_addr
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(service.clone())
            .configure(http::routes::init_routes)
            .default_service(web::to(http::routes::not_found))
    })
    .bind(&settings.server_addr)?
    .run()
    .await?;

    Ok(())
}
