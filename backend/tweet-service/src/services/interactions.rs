/// Interaction service - tweets, replies, like/retweet/follow toggles
///
/// Every operation takes the acting user explicitly. Successful writes drop
/// the profile sub-feed cache entries the event affects; a cache failure is
/// logged and never fails the write.
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::cache::{ProfileFeed, ProfileFeedCache};
use crate::domain::{validation, FollowAction, NewTweet, ToggleAction, Tweet};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{TWEETS_CREATED, TWEET_INTERACTIONS};
use crate::repository::SocialRepository;
use crate::session::Actor;

#[derive(Clone)]
pub struct InteractionService {
    repo: Arc<dyn SocialRepository>,
    cache: Option<ProfileFeedCache>,
}

impl InteractionService {
    pub fn new(repo: Arc<dyn SocialRepository>) -> Self {
        Self { repo, cache: None }
    }

    pub fn with_cache(repo: Arc<dyn SocialRepository>, cache: ProfileFeedCache) -> Self {
        Self {
            repo,
            cache: Some(cache),
        }
    }

    /// Publish a top-level tweet
    pub async fn create_tweet(
        &self,
        actor: &Actor,
        content: &str,
        image_url: Option<&str>,
    ) -> ServiceResult<Tweet> {
        let tweet = self
            .repo
            .insert_tweet(NewTweet {
                author_id: actor.id,
                content: validation::tweet_content(content)?,
                image_url: validation::image_url(image_url)?,
                parent_id: None,
            })
            .await?;

        TWEETS_CREATED.with_label_values(&["tweet"]).inc();
        info!(tweet_id = %tweet.id, author_id = %actor.id, "Tweet created");

        self.invalidate(ProfileFeed::Tweets, actor.id).await;
        Ok(tweet)
    }

    /// Publish a reply under `parent_id`. Replies to replies are allowed.
    pub async fn create_reply_tweet(
        &self,
        actor: &Actor,
        parent_id: Uuid,
        content: &str,
        image_url: Option<&str>,
    ) -> ServiceResult<Tweet> {
        let tweet = self
            .repo
            .insert_tweet(NewTweet {
                author_id: actor.id,
                content: validation::tweet_content(content)?,
                image_url: validation::image_url(image_url)?,
                parent_id: Some(parent_id),
            })
            .await?;

        TWEETS_CREATED.with_label_values(&["reply"]).inc();
        info!(
            tweet_id = %tweet.id,
            parent_id = %parent_id,
            author_id = %actor.id,
            "Reply created"
        );

        self.invalidate(ProfileFeed::Replies, actor.id).await;
        Ok(tweet)
    }

    /// Like the tweet, or remove the like if the actor already liked it
    pub async fn like_tweet(&self, actor: &Actor, tweet_id: Uuid) -> ServiceResult<ToggleAction> {
        let action = self.repo.toggle_like(actor.id, tweet_id).await?;

        TWEET_INTERACTIONS
            .with_label_values(&["like", action.as_str()])
            .inc();
        info!(tweet_id = %tweet_id, user_id = %actor.id, action = action.as_str(), "Like toggled");

        self.invalidate(ProfileFeed::Likes, actor.id).await;
        Ok(action)
    }

    /// Retweet the tweet, or undo the retweet if it already exists
    pub async fn retweet_tweet(
        &self,
        actor: &Actor,
        tweet_id: Uuid,
    ) -> ServiceResult<ToggleAction> {
        let action = self.repo.toggle_retweet(actor.id, tweet_id).await?;

        TWEET_INTERACTIONS
            .with_label_values(&["retweet", action.as_str()])
            .inc();
        info!(tweet_id = %tweet_id, user_id = %actor.id, action = action.as_str(), "Retweet toggled");

        self.invalidate(ProfileFeed::Retweets, actor.id).await;
        Ok(action)
    }

    /// Follow `target_id`, or unfollow if already following
    pub async fn follow_user(&self, actor: &Actor, target_id: Uuid) -> ServiceResult<FollowAction> {
        if actor.id == target_id {
            return Err(ServiceError::InvalidInput(
                "cannot follow yourself".to_string(),
            ));
        }

        let action: FollowAction = self.repo.toggle_follow(actor.id, target_id).await?.into();

        TWEET_INTERACTIONS
            .with_label_values(&["follow", action.as_str()])
            .inc();
        info!(
            follower_id = %actor.id,
            following_id = %target_id,
            action = action.as_str(),
            "Follow toggled"
        );

        Ok(action)
    }

    async fn invalidate(&self, feed: ProfileFeed, user_id: Uuid) {
        if let Some(cache) = &self.cache {
            cache.invalidate_user(feed, user_id).await;
        }
    }
}
