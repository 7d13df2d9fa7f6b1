//! Prometheus metrics for tweet-service.
//!
//! Collectors are registered in the default registry and rendered by
//! [`serve_metrics`] on `/metrics`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Like/retweet/follow toggles segmented by kind and resulting action.
    pub static ref TWEET_INTERACTIONS: IntCounterVec = register_int_counter_vec!(
        "tweet_interactions_total",
        "Interaction toggles segmented by kind (like, retweet, follow) and action",
        &["kind", "action"]
    )
    .expect("failed to register tweet_interactions_total");

    /// Profile cache events (hit/miss/invalidate/error).
    pub static ref PROFILE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "profile_cache_events_total",
        "Profile sub-feed cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register profile_cache_events_total");

    /// Tweets created, top-level vs reply.
    pub static ref TWEETS_CREATED: IntCounterVec = register_int_counter_vec!(
        "tweets_created_total",
        "Tweets created segmented by kind (tweet, reply)",
        &["kind"]
    )
    .expect("failed to register tweets_created_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
