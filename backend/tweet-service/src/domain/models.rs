use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - profile fields owned by this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    /// Profile banner
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user as provisioned by the identity provider
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
}

/// Profile fields a user may change about themselves
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

/// Live aggregates shown on a profile page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub posts_count: i64,
    pub replies_count: i64,
    pub likes_count: i64,
    pub retweets_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub stats: UserStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePage {
    pub profile: UserProfile,
    pub is_following: bool,
}

/// Tweet entity. `parent_id` is `None` for top-level posts, `Some` for replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tweet {
    pub id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTweet {
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// Like join row - at most one per (user_id, tweet_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tweet_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Retweet join row - at most one per (user_id, tweet_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Retweet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tweet_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Follow join row - at most one per (follower_id, following_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Author projection embedded in every tweet read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
}

/// Minimal like/retweet row embedded in tweet reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// Tweet with author projection and full like/retweet collections.
///
/// Viewer-independent, so it is what the profile cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetDetail {
    #[serde(flatten)]
    pub tweet: Tweet,
    pub author: AuthorSummary,
    pub likes: Vec<Engagement>,
    pub retweets: Vec<Engagement>,
}

impl TweetDetail {
    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|l| l.user_id == user_id)
    }

    pub fn is_retweeted_by(&self, user_id: Uuid) -> bool {
        self.retweets.iter().any(|r| r.user_id == user_id)
    }

    /// Attach viewer flags. Anonymous viewers see both flags as false.
    pub fn into_view(self, viewer: Option<Uuid>) -> TweetView {
        let is_liked = viewer.map(|v| self.is_liked_by(v)).unwrap_or(false);
        let is_retweeted = viewer.map(|v| self.is_retweeted_by(v)).unwrap_or(false);
        TweetView {
            like_count: self.likes.len() as i64,
            retweet_count: self.retweets.len() as i64,
            is_liked,
            is_retweeted,
            detail: self,
        }
    }
}

/// Tweet as returned to a particular viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetView {
    #[serde(flatten)]
    pub detail: TweetDetail,
    pub like_count: i64,
    pub retweet_count: i64,
    pub is_liked: bool,
    pub is_retweeted: bool,
}

/// Outcome of a like or retweet toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

impl ToggleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleAction::Added => "added",
            ToggleAction::Removed => "removed",
        }
    }
}

/// Outcome of a follow toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowAction {
    Followed,
    Unfollowed,
}

impl From<ToggleAction> for FollowAction {
    fn from(action: ToggleAction) -> Self {
        match action {
            ToggleAction::Added => FollowAction::Followed,
            ToggleAction::Removed => FollowAction::Unfollowed,
        }
    }
}

impl FollowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowAction::Followed => "followed",
            FollowAction::Unfollowed => "unfollowed",
        }
    }
}

/// Offset pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Build a page from optional query parameters, clamping into range.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Page of tweets with a continuation hint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetPage {
    pub tweets: Vec<TweetView>,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl TweetPage {
    pub fn new(details: Vec<TweetDetail>, page: Page, viewer: Option<Uuid>) -> Self {
        let has_more = details.len() as i64 == page.limit;
        Self {
            tweets: details.into_iter().map(|d| d.into_view(viewer)).collect(),
            limit: page.limit,
            offset: page.offset,
            has_more,
        }
    }
}
