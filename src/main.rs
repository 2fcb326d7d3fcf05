mod config;
mod core;
mod feed;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::Matcher;
use crate::feed::FeedRegistry;
use crate::models::ScoringWeights;
use crate::routes::matches::AppState;
use crate::services::{ServiceCatalog, ZoneRegistry};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Configuration comes first so logging can honor the configured
    // level and format
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => panic!("Configuration error: {}", e),
    };

    // RUST_LOG still overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting ZoneMatch service...");
    info!("Configuration loaded successfully");

    // Seed the zone registry
    let zones = match &settings.data.zones_path {
        Some(path) => match ZoneRegistry::load_from_file(path) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("Failed to load zones from {} ({}), starting empty", path, e);
                ZoneRegistry::new()
            }
        },
        None => {
            warn!("No zones file configured, starting with an empty registry");
            ZoneRegistry::new()
        }
    };
    let zones = Arc::new(zones);

    // Seed the service catalog
    let catalog = match &settings.data.services_path {
        Some(path) => match ServiceCatalog::load_from_file(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Failed to load services from {} ({}), starting empty", path, e);
                ServiceCatalog::new()
            }
        },
        None => ServiceCatalog::new(),
    };
    let catalog = Arc::new(catalog);

    info!(
        "Registry ready: {} zones, {} services",
        zones.len(),
        catalog.len()
    );

    // Live feed registry, one per server instance
    let feed = Arc::new(FeedRegistry::new());

    // Initialize matcher with configured weights
    let weights = ScoringWeights {
        service: settings.scoring.weights.service,
        demand: settings.scoring.weights.demand,
        proximity: settings.scoring.weights.proximity,
    };

    let matcher = Matcher::new(weights);

    info!("Matcher initialized with weights: {:?}", weights);

    // Build application state
    let app_state = AppState {
        zones,
        catalog,
        feed: feed.clone(),
        matcher,
        max_limit: settings.matching.max_limit,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    // Close any streams still open before exiting
    feed.shutdown();

    result
}
