use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tweet_service::cache::{CacheBackend, LocalCacheBackend, ProfileFeedCache, RedisCacheBackend};
use tweet_service::config::{CacheConfig, Config, StorageBackend, StorageConfig};
use tweet_service::repository::{InMemorySocialRepository, PgSocialRepository, SocialRepository};
use tweet_service::services::ImageUploader;
use tweet_service::{configure, AppState, SessionMiddleware};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    info!("Starting tweet-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let repo = connect_storage(&config.storage).await?;
    let cache = connect_cache(&config.cache).await;
    let uploader = match &config.media.upload_url {
        Some(url) => Some(ImageUploader::new(url.clone(), config.media.upload_preset.clone())?),
        None => {
            warn!("IMAGE_UPLOAD_URL not set - image uploads disabled");
            None
        }
    };

    let state = web::Data::new(AppState::new(repo, cache, uploader));
    let jwt_secret = config.auth.jwt_secret.clone();
    let origins = config.cors.origins();
    let bind_address = format!("{}:{}", config.app.host, config.app.port);

    info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allowed_methods(vec!["GET", "POST", "PUT"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(SessionMiddleware::new(jwt_secret.as_bytes()))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("tweet-service shut down");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tweet_service=info,actix_web=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn connect_storage(config: &StorageConfig) -> Result<Arc<dyn SocialRepository>> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage - data is lost on restart");
            Ok(Arc::new(InMemorySocialRepository::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for postgres storage")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .test_before_acquire(true)
                .connect(url)
                .await
                .context("Failed to create database pool")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            info!(
                max_connections = config.max_connections,
                "Connected to PostgreSQL"
            );
            Ok(Arc::new(PgSocialRepository::new(pool)))
        }
    }
}

/// Redis when configured and reachable, otherwise the in-process cache.
async fn connect_cache(config: &CacheConfig) -> Option<ProfileFeedCache> {
    if !config.enabled {
        info!("Profile cache disabled");
        return None;
    }

    let ttl = Duration::from_secs(config.ttl_secs);
    let backend: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => match connect_redis(url).await {
            Ok(manager) => {
                info!("Connected to Redis for profile caching");
                Arc::new(RedisCacheBackend::new(manager))
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis - using local cache");
                Arc::new(LocalCacheBackend::new())
            }
        },
        None => Arc::new(LocalCacheBackend::new()),
    };

    Some(ProfileFeedCache::new(backend, ttl))
}

async fn connect_redis(url: &str) -> Result<redis::aio::ConnectionManager> {
    let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
    let manager = redis::aio::ConnectionManager::new(client)
        .await
        .context("Redis connection failed")?;
    Ok(manager)
}
