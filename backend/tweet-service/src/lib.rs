//! Tweet service
//!
//! Tweets, replies, like/retweet/follow toggles and the read paths behind the
//! global feed and profile pages.
//!
//! Layers:
//! - `handlers`: HTTP surface (actix-web), result envelope
//! - `services`: interaction and query logic, explicit actor context
//! - `cache`: time-boxed profile sub-feed cache with event-keyed invalidation
//! - `repository`: persistence gateway (PostgreSQL, in-memory)

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod repository;
pub mod response;
pub mod services;
pub mod session;

pub use config::Config;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use handlers::{configure, AppState};
pub use response::ApiResponse;
pub use session::{Actor, CurrentUser, SessionMiddleware};
