/// Feed query service - global feed, tweet threads and profile sub-feeds
///
/// Reads return `TweetPage`s with viewer flags attached after the fetch, so
/// cached pages are shared between viewers.
use std::sync::Arc;

use uuid::Uuid;

use crate::cache::{ProfileFeed, ProfileFeedCache};
use crate::domain::{Page, TweetDetail, TweetPage, TweetView, User};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::SocialRepository;
use crate::session::Actor;

#[derive(Clone)]
pub struct FeedService {
    repo: Arc<dyn SocialRepository>,
    cache: Option<ProfileFeedCache>,
}

impl FeedService {
    pub fn new(repo: Arc<dyn SocialRepository>) -> Self {
        Self { repo, cache: None }
    }

    pub fn with_cache(repo: Arc<dyn SocialRepository>, cache: ProfileFeedCache) -> Self {
        Self {
            repo,
            cache: Some(cache),
        }
    }

    /// Global feed of top-level tweets, newest first
    pub async fn get_tweets(&self, viewer: Option<Uuid>, page: Page) -> ServiceResult<TweetPage> {
        let tweets = self.repo.list_feed(page).await?;
        Ok(TweetPage::new(tweets, page, viewer))
    }

    pub async fn get_tweet_by_id(
        &self,
        viewer: Option<Uuid>,
        tweet_id: Uuid,
    ) -> ServiceResult<TweetView> {
        self.repo
            .find_tweet(tweet_id)
            .await?
            .map(|detail| detail.into_view(viewer))
            .ok_or_else(|| ServiceError::NotFound("tweet".to_string()))
    }

    /// Direct replies to a tweet, newest first
    pub async fn get_tweet_replies(
        &self,
        viewer: Option<Uuid>,
        tweet_id: Uuid,
        page: Page,
    ) -> ServiceResult<TweetPage> {
        let tweets = self.repo.list_replies(tweet_id, page).await?;
        Ok(TweetPage::new(tweets, page, viewer))
    }

    pub async fn get_user_tweets(
        &self,
        viewer: Option<Uuid>,
        username: &str,
        page: Page,
    ) -> ServiceResult<TweetPage> {
        self.profile_feed(ProfileFeed::Tweets, viewer, username, page)
            .await
    }

    pub async fn get_user_replies(
        &self,
        viewer: Option<Uuid>,
        username: &str,
        page: Page,
    ) -> ServiceResult<TweetPage> {
        self.profile_feed(ProfileFeed::Replies, viewer, username, page)
            .await
    }

    pub async fn get_user_likes(
        &self,
        viewer: Option<Uuid>,
        username: &str,
        page: Page,
    ) -> ServiceResult<TweetPage> {
        self.profile_feed(ProfileFeed::Likes, viewer, username, page)
            .await
    }

    pub async fn get_user_retweets(
        &self,
        viewer: Option<Uuid>,
        username: &str,
        page: Page,
    ) -> ServiceResult<TweetPage> {
        self.profile_feed(ProfileFeed::Retweets, viewer, username, page)
            .await
    }

    /// Whether the actor follows `target_id`. Always false for oneself.
    pub async fn check_follow_status(&self, actor: &Actor, target_id: Uuid) -> ServiceResult<bool> {
        if actor.id == target_id {
            return Ok(false);
        }
        self.repo.is_following(actor.id, target_id).await
    }

    async fn profile_feed(
        &self,
        feed: ProfileFeed,
        viewer: Option<Uuid>,
        username: &str,
        page: Page,
    ) -> ServiceResult<TweetPage> {
        let user = self.user_by_username(username).await?;

        if let Some(cache) = &self.cache {
            if let Some(tweets) = cache.get(feed, user.id, page).await {
                return Ok(TweetPage::new(tweets, page, viewer));
            }
        }

        let tweets = self.load_profile_feed(feed, user.id, page).await?;

        if let Some(cache) = &self.cache {
            cache.put(feed, user.id, page, &tweets).await;
        }

        Ok(TweetPage::new(tweets, page, viewer))
    }

    async fn load_profile_feed(
        &self,
        feed: ProfileFeed,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        match feed {
            ProfileFeed::Tweets => self.repo.list_user_tweets(user_id, page).await,
            ProfileFeed::Replies => self.repo.list_user_replies(user_id, page).await,
            ProfileFeed::Likes => self.repo.list_liked_tweets(user_id, page).await,
            ProfileFeed::Retweets => self.repo.list_retweeted_tweets(user_id, page).await,
        }
    }

    async fn user_by_username(&self, username: &str) -> ServiceResult<User> {
        self.repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))
    }
}
