//! In-process persistence gateway
//!
//! Mirrors the schema constraints (unique usernames, unique join pairs,
//! foreign keys) so services behave the same as against PostgreSQL.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::SocialRepository;
use crate::domain::{
    AuthorSummary, Engagement, Follow, Like, NewTweet, NewUser, Page, ProfileUpdate, Retweet,
    ToggleAction, Tweet, TweetDetail, User, UserStats,
};
use crate::error::{ServiceError, ServiceResult};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    tweets: HashMap<Uuid, Tweet>,
    likes: Vec<Like>,
    retweets: Vec<Retweet>,
    follows: Vec<Follow>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing timestamps keep newest-first ordering deterministic.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username.as_deref() == Some(username) && Some(u.id) != except)
    }

    fn detail(&self, tweet: &Tweet) -> ServiceResult<TweetDetail> {
        let author = self
            .users
            .get(&tweet.author_id)
            .ok_or_else(|| ServiceError::Internal(format!("tweet {} has no author", tweet.id)))?;

        Ok(TweetDetail {
            tweet: tweet.clone(),
            author: AuthorSummary {
                id: author.id,
                name: author.name.clone(),
                username: author.username.clone(),
                avatar: author.avatar.clone(),
            },
            likes: self
                .likes
                .iter()
                .filter(|l| l.tweet_id == tweet.id)
                .map(|l| Engagement {
                    id: l.id,
                    user_id: l.user_id,
                })
                .collect(),
            retweets: self
                .retweets
                .iter()
                .filter(|r| r.tweet_id == tweet.id)
                .map(|r| Engagement {
                    id: r.id,
                    user_id: r.user_id,
                })
                .collect(),
        })
    }

    /// Newest-first page of tweets matching `filter`
    fn tweets_where<F>(&self, page: Page, filter: F) -> ServiceResult<Vec<TweetDetail>>
    where
        F: Fn(&Tweet) -> bool,
    {
        let mut matching: Vec<&Tweet> = self.tweets.values().filter(|t| filter(t)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.paged(matching.into_iter(), page)
    }

    fn paged<'a, I>(&self, tweets: I, page: Page) -> ServiceResult<Vec<TweetDetail>>
    where
        I: Iterator<Item = &'a Tweet>,
    {
        tweets
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|t| self.detail(t))
            .collect()
    }

    fn require_user(&self, user_id: Uuid) -> ServiceResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(ServiceError::NotFound("user".to_string()))
        }
    }

    fn require_tweet(&self, tweet_id: Uuid) -> ServiceResult<()> {
        if self.tweets.contains_key(&tweet_id) {
            Ok(())
        } else {
            Err(ServiceError::NotFound("tweet".to_string()))
        }
    }
}

#[derive(Default)]
pub struct InMemorySocialRepository {
    state: RwLock<State>,
}

impl InMemorySocialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SocialRepository for InMemorySocialRepository {
    async fn insert_user(&self, user: NewUser) -> ServiceResult<User> {
        let mut state = self.state.write().await;

        if state.users.contains_key(&user.id) {
            return Err(ServiceError::Conflict("user already exists".to_string()));
        }
        if let Some(username) = user.username.as_deref() {
            if state.username_taken(username, None) {
                return Err(ServiceError::Conflict("username is already taken".to_string()));
            }
        }

        let now = state.next_timestamp();
        let user = User {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            bio: None,
            avatar: None,
            image: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<User> {
        let mut state = self.state.write().await;
        state.require_user(user_id)?;

        if let Some(username) = update.username.as_deref() {
            if state.username_taken(username, Some(user_id)) {
                return Err(ServiceError::Conflict("username is already taken".to_string()));
            }
        }

        let now = state.next_timestamp();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;

        user.name = update.name;
        if update.username.is_some() {
            user.username = update.username;
        }
        if update.bio.is_some() {
            user.bio = update.bio;
        }
        if update.avatar.is_some() {
            user.avatar = update.avatar;
        }
        if update.banner.is_some() {
            user.image = update.banner;
        }
        user.updated_at = now;

        Ok(user.clone())
    }

    async fn user_stats(&self, user_id: Uuid) -> ServiceResult<UserStats> {
        let state = self.state.read().await;
        let authored = state.tweets.values().filter(|t| t.author_id == user_id);
        let (replies, posts): (Vec<&Tweet>, Vec<&Tweet>) =
            authored.partition(|t| t.parent_id.is_some());

        Ok(UserStats {
            posts_count: posts.len() as i64,
            replies_count: replies.len() as i64,
            likes_count: state.likes.iter().filter(|l| l.user_id == user_id).count() as i64,
            retweets_count: state.retweets.iter().filter(|r| r.user_id == user_id).count() as i64,
            followers_count: state
                .follows
                .iter()
                .filter(|f| f.following_id == user_id)
                .count() as i64,
            following_count: state
                .follows
                .iter()
                .filter(|f| f.follower_id == user_id)
                .count() as i64,
        })
    }

    async fn insert_tweet(&self, tweet: NewTweet) -> ServiceResult<Tweet> {
        let mut state = self.state.write().await;
        state.require_user(tweet.author_id)?;
        if let Some(parent_id) = tweet.parent_id {
            if !state.tweets.contains_key(&parent_id) {
                return Err(ServiceError::NotFound("parent tweet".to_string()));
            }
        }

        let tweet = Tweet {
            id: Uuid::new_v4(),
            content: tweet.content,
            image_url: tweet.image_url,
            parent_id: tweet.parent_id,
            author_id: tweet.author_id,
            created_at: state.next_timestamp(),
        };
        state.tweets.insert(tweet.id, tweet.clone());
        Ok(tweet)
    }

    async fn find_tweet(&self, tweet_id: Uuid) -> ServiceResult<Option<TweetDetail>> {
        let state = self.state.read().await;
        state.tweets.get(&tweet_id).map(|t| state.detail(t)).transpose()
    }

    async fn list_feed(&self, page: Page) -> ServiceResult<Vec<TweetDetail>> {
        let state = self.state.read().await;
        state.tweets_where(page, |t| t.parent_id.is_none())
    }

    async fn list_replies(&self, parent_id: Uuid, page: Page) -> ServiceResult<Vec<TweetDetail>> {
        let state = self.state.read().await;
        state.tweets_where(page, |t| t.parent_id == Some(parent_id))
    }

    async fn list_user_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let state = self.state.read().await;
        state.tweets_where(page, |t| t.author_id == user_id && t.parent_id.is_none())
    }

    async fn list_user_replies(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let state = self.state.read().await;
        state.tweets_where(page, |t| t.author_id == user_id && t.parent_id.is_some())
    }

    async fn list_liked_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let state = self.state.read().await;
        let mut likes: Vec<&Like> = state.likes.iter().filter(|l| l.user_id == user_id).collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        state.paged(
            likes.into_iter().filter_map(|l| state.tweets.get(&l.tweet_id)),
            page,
        )
    }

    async fn list_retweeted_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let state = self.state.read().await;
        let mut retweets: Vec<&Retweet> = state
            .retweets
            .iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        retweets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        state.paged(
            retweets.into_iter().filter_map(|r| state.tweets.get(&r.tweet_id)),
            page,
        )
    }

    async fn toggle_like(&self, user_id: Uuid, tweet_id: Uuid) -> ServiceResult<ToggleAction> {
        let mut state = self.state.write().await;

        if let Some(pos) = state
            .likes
            .iter()
            .position(|l| l.user_id == user_id && l.tweet_id == tweet_id)
        {
            state.likes.remove(pos);
            return Ok(ToggleAction::Removed);
        }

        state.require_user(user_id)?;
        state.require_tweet(tweet_id)?;
        let created_at = state.next_timestamp();
        state.likes.push(Like {
            id: Uuid::new_v4(),
            user_id,
            tweet_id,
            created_at,
        });
        Ok(ToggleAction::Added)
    }

    async fn toggle_retweet(&self, user_id: Uuid, tweet_id: Uuid) -> ServiceResult<ToggleAction> {
        let mut state = self.state.write().await;

        if let Some(pos) = state
            .retweets
            .iter()
            .position(|r| r.user_id == user_id && r.tweet_id == tweet_id)
        {
            state.retweets.remove(pos);
            return Ok(ToggleAction::Removed);
        }

        state.require_user(user_id)?;
        state.require_tweet(tweet_id)?;
        let created_at = state.next_timestamp();
        state.retweets.push(Retweet {
            id: Uuid::new_v4(),
            user_id,
            tweet_id,
            created_at,
        });
        Ok(ToggleAction::Added)
    }

    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> ServiceResult<ToggleAction> {
        let mut state = self.state.write().await;

        if let Some(pos) = state
            .follows
            .iter()
            .position(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            state.follows.remove(pos);
            return Ok(ToggleAction::Removed);
        }

        state.require_user(follower_id)?;
        state.require_user(following_id)?;
        let created_at = state.next_timestamp();
        state.follows.push(Follow {
            id: Uuid::new_v4(),
            follower_id,
            following_id,
            created_at,
        });
        Ok(ToggleAction::Added)
    }

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> ServiceResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id))
    }
}
