use crate::feed::{FeedConnection, SubscriberFilter};
use crate::models::{
    ErrorResponse, FeedQuery, FeedStatsResponse, PublishEventRequest, PublishEventResponse,
};
use crate::routes::matches::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Configure live feed routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/feed/live", web::get().to(live_feed))
        .route("/feed/events", web::post().to(publish_event))
        .route("/feed/stats", web::get().to(feed_stats));
}

/// Live feed stream endpoint
///
/// GET /api/v1/feed/live?zoneIds=Z1,Z2&includeOutOfZone=true
///
/// Opens a Server-Sent Events stream filtered by zone membership. Events are
/// delivered at most once and only while the connection is open.
async fn live_feed(state: web::Data<AppState>, query: web::Query<FeedQuery>) -> impl Responder {
    let filter = SubscriberFilter::from(&*query);
    tracing::info!(
        "Feed subscriber connecting: zones={:?} includeOutOfZone={} outOfZoneOnly={}",
        filter.zone_ids,
        filter.include_out_of_zone,
        filter.out_of_zone_only
    );

    let connection = FeedConnection::open(&state.feed, filter);
    state
        .feed
        .send_direct(connection.id(), "connected", &json!({ "subscriberId": connection.id() }));

    // The connection drives the response; when the client goes away the
    // stream (and the connection inside it) drops and the subscriber is
    // unregistered immediately.
    let stream = futures::stream::unfold(connection, |mut conn| async move {
        conn.recv()
            .await
            .map(|frame| (Ok::<_, actix_web::Error>(frame), conn))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream)
}

/// Publish a marketplace event to the live feed
///
/// POST /api/v1/feed/events
///
/// Request body:
/// ```json
/// {
///   "event": "job.posted",
///   "payload": { "zoneId": "Z1", "title": "Boiler repair" }
/// }
/// ```
async fn publish_event(
    state: web::Data<AppState>,
    req: web::Json<PublishEventRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let delivered = state.feed.broadcast(&req.event, &req.payload);
    tracing::debug!("Event {} delivered to {} subscribers", req.event, delivered);

    HttpResponse::Ok().json(PublishEventResponse {
        delivered,
        active_connections: state.feed.active_connections(),
    })
}

/// Feed observability counters
///
/// GET /api/v1/feed/stats
async fn feed_stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(FeedStatsResponse {
        active_connections: state.feed.active_connections(),
    })
}
