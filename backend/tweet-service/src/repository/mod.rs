//! Persistence gateway
//!
//! `SocialRepository` is the typed access layer over users, tweets, likes,
//! retweets and follows. PostgreSQL is the source of truth; the in-memory
//! implementation backs local development and the test-suite.

mod memory;
mod postgres;

pub use memory::InMemorySocialRepository;
pub use postgres::PgSocialRepository;

use uuid::Uuid;

use crate::domain::{
    NewTweet, NewUser, Page, ProfileUpdate, ToggleAction, Tweet, TweetDetail, User, UserStats,
};
use crate::error::ServiceResult;

#[async_trait::async_trait]
pub trait SocialRepository: Send + Sync {
    // ---- users ----

    /// Insert a user row (identity-provider provisioning path)
    async fn insert_user(&self, user: NewUser) -> ServiceResult<User>;

    async fn find_user_by_id(&self, user_id: Uuid) -> ServiceResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>>;

    /// Update profile fields. A taken username surfaces as `Conflict`.
    async fn update_user_profile(&self, user_id: Uuid, update: ProfileUpdate)
        -> ServiceResult<User>;

    /// Live aggregates for a profile page
    async fn user_stats(&self, user_id: Uuid) -> ServiceResult<UserStats>;

    // ---- tweets ----

    /// Insert a tweet or reply. A missing parent surfaces as `NotFound`.
    async fn insert_tweet(&self, tweet: NewTweet) -> ServiceResult<Tweet>;

    async fn find_tweet(&self, tweet_id: Uuid) -> ServiceResult<Option<TweetDetail>>;

    /// Top-level tweets, newest first
    async fn list_feed(&self, page: Page) -> ServiceResult<Vec<TweetDetail>>;

    /// Direct replies to a tweet, newest first
    async fn list_replies(&self, parent_id: Uuid, page: Page) -> ServiceResult<Vec<TweetDetail>>;

    /// Top-level tweets authored by a user, newest first
    async fn list_user_tweets(&self, user_id: Uuid, page: Page)
        -> ServiceResult<Vec<TweetDetail>>;

    /// Replies authored by a user, newest first
    async fn list_user_replies(&self, user_id: Uuid, page: Page)
        -> ServiceResult<Vec<TweetDetail>>;

    /// Tweets liked by a user, most recent like first
    async fn list_liked_tweets(&self, user_id: Uuid, page: Page)
        -> ServiceResult<Vec<TweetDetail>>;

    /// Tweets retweeted by a user, most recent retweet first
    async fn list_retweeted_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>>;

    // ---- interactions ----

    /// Atomically remove the (user, tweet) like if present, otherwise add it.
    async fn toggle_like(&self, user_id: Uuid, tweet_id: Uuid) -> ServiceResult<ToggleAction>;

    /// Atomically remove the (user, tweet) retweet if present, otherwise add it.
    async fn toggle_retweet(&self, user_id: Uuid, tweet_id: Uuid) -> ServiceResult<ToggleAction>;

    /// Atomically remove the follow edge if present, otherwise add it.
    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> ServiceResult<ToggleAction>;

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> ServiceResult<bool>;

    async fn health_check(&self) -> ServiceResult<()> {
        Ok(())
    }
}
