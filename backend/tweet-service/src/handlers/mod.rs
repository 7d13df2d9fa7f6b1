/// HTTP handlers and route table
pub mod media;
pub mod tweets;
pub mod users;

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::cache::ProfileFeedCache;
use crate::domain::Page;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::serve_metrics;
use crate::repository::SocialRepository;
use crate::services::{FeedService, ImageUploader, InteractionService, ProfileService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub interactions: InteractionService,
    pub feed: FeedService,
    pub profiles: ProfileService,
    /// `None` when no image host is configured
    pub uploader: Option<ImageUploader>,
    pub repo: Arc<dyn SocialRepository>,
}

impl AppState {
    /// Wire the services over one repository and an optional shared cache.
    pub fn new(
        repo: Arc<dyn SocialRepository>,
        cache: Option<ProfileFeedCache>,
        uploader: Option<ImageUploader>,
    ) -> Self {
        let (interactions, feed) = match cache {
            Some(cache) => (
                InteractionService::with_cache(repo.clone(), cache.clone()),
                FeedService::with_cache(repo.clone(), cache),
            ),
            None => (
                InteractionService::new(repo.clone()),
                FeedService::new(repo.clone()),
            ),
        };

        Self {
            interactions,
            feed,
            profiles: ProfileService::new(repo.clone()),
            uploader,
            repo,
        }
    }
}

/// `?limit=&offset=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
}

/// Register every route plus extractor error handlers that render the
/// failure envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ServiceError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ServiceError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| ServiceError::InvalidInput(err.to_string()).into()),
    )
    .route("/health", web::get().to(health))
    .route("/ready", web::get().to(ready))
    .route("/metrics", web::get().to(serve_metrics))
    .service(
        web::scope("/api/v1")
            .service(
                web::scope("/tweets")
                    .route("", web::get().to(tweets::get_tweets))
                    .route("", web::post().to(tweets::create_tweet))
                    .route("/{id}", web::get().to(tweets::get_tweet))
                    .route("/{id}/replies", web::get().to(tweets::get_replies))
                    .route("/{id}/replies", web::post().to(tweets::create_reply))
                    .route("/{id}/like", web::post().to(tweets::like_tweet))
                    .route("/{id}/retweet", web::post().to(tweets::retweet_tweet)),
            )
            .service(
                web::scope("/users")
                    .route("/{username}", web::get().to(users::get_profile_page))
                    .route("/{username}/tweets", web::get().to(users::get_user_tweets))
                    .route("/{username}/replies", web::get().to(users::get_user_replies))
                    .route("/{username}/likes", web::get().to(users::get_user_likes))
                    .route("/{username}/retweets", web::get().to(users::get_user_retweets))
                    .route("/{id}/follow", web::post().to(users::follow_user))
                    .route("/{id}/follow-status", web::get().to(users::follow_status)),
            )
            .route("/me/profile", web::put().to(users::update_profile))
            .route("/media/images", web::post().to(media::upload_image)),
    );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus { status: "ok" })
}

async fn ready(state: web::Data<AppState>) -> ServiceResult<HttpResponse> {
    state.repo.health_check().await?;
    Ok(HttpResponse::Ok().json(HealthStatus { status: "ready" }))
}
