use crate::core::{MatchOptions, Matcher};
use crate::feed::FeedRegistry;
use crate::models::{ErrorResponse, HealthResponse, MatchPointRequest, MatchPointResponse, Point};
use crate::services::{ServiceCatalog, ZoneRegistry};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub zones: Arc<ZoneRegistry>,
    pub catalog: Arc<ServiceCatalog>,
    pub feed: Arc<FeedRegistry>,
    pub matcher: Matcher,
    pub max_limit: usize,
}

/// Configure matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/zones/match", web::post().to(match_point));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.zones.is_empty() { "degraded" } else { "healthy" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Match a point against the zone catalogue
///
/// POST /api/v1/zones/match
///
/// Request body:
/// ```json
/// {
///   "latitude": 51.512,
///   "longitude": -0.11,
///   "radiusKm": 25,
///   "limit": 10
/// }
/// ```
async fn match_point(
    state: web::Data<AppState>,
    req: web::Json<MatchPointRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let point = Point {
        lng: req.longitude,
        lat: req.latitude,
    };
    let options = MatchOptions {
        radius_km: req.radius_km,
        limit: req.limit.map(|l| (l as usize).min(state.max_limit)),
    };

    tracing::info!(
        "Matching point ({}, {}) radius={:?} limit={:?}",
        req.latitude,
        req.longitude,
        options.radius_km,
        options.limit
    );

    let zones = state.zones.snapshot();
    let services_by_zone = state.catalog.services_for_zones(&zones);

    let outcome = match state
        .matcher
        .match_point(&point, zones, &services_by_zone, &options)
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::info!("Match rejected: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid match request".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    tracing::info!(
        "Returning {} matches (fallback: {})",
        outcome.matches.len(),
        outcome.fallback.is_some()
    );

    HttpResponse::Ok().json(MatchPointResponse {
        matches: outcome.matches,
        fallback: outcome.fallback,
        total_services: outcome.total_services,
    })
}
