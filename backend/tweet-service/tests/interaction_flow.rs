//! Service-level flows against the in-memory repository and local cache.

use std::sync::Arc;
use std::time::Duration;

use tweet_service::cache::{LocalCacheBackend, ProfileFeed, ProfileFeedCache};
use tweet_service::domain::{FollowAction, NewTweet, NewUser, Page, ToggleAction, User};
use tweet_service::repository::{InMemorySocialRepository, SocialRepository};
use tweet_service::services::{FeedService, InteractionService};
use tweet_service::{Actor, ServiceError};
use uuid::Uuid;

struct Harness {
    repo: Arc<InMemorySocialRepository>,
    cache: ProfileFeedCache,
    interactions: InteractionService,
    feed: FeedService,
}

impl Harness {
    fn new() -> Self {
        let repo = Arc::new(InMemorySocialRepository::new());
        let cache = ProfileFeedCache::new(
            Arc::new(LocalCacheBackend::new()),
            Duration::from_secs(300),
        );
        Self {
            interactions: InteractionService::with_cache(repo.clone(), cache.clone()),
            feed: FeedService::with_cache(repo.clone(), cache.clone()),
            repo,
            cache,
        }
    }

    async fn user(&self, username: &str) -> (User, Actor) {
        let user = self
            .repo
            .insert_user(NewUser {
                id: Uuid::new_v4(),
                name: username.to_string(),
                username: Some(username.to_string()),
                email: format!("{}@example.com", username),
            })
            .await
            .unwrap();
        let actor = Actor {
            id: user.id,
            username: user.username.clone(),
        };
        (user, actor)
    }
}

#[tokio::test]
async fn like_toggles_on_then_off() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let (_, bob) = h.user("bob").await;
    let tweet = h.interactions.create_tweet(&alice, "hello", None).await.unwrap();

    assert_eq!(
        h.interactions.like_tweet(&bob, tweet.id).await.unwrap(),
        ToggleAction::Added
    );
    let view = h.feed.get_tweet_by_id(Some(bob.id), tweet.id).await.unwrap();
    assert!(view.is_liked);
    assert_eq!(view.like_count, 1);

    assert_eq!(
        h.interactions.like_tweet(&bob, tweet.id).await.unwrap(),
        ToggleAction::Removed
    );
    let view = h.feed.get_tweet_by_id(Some(bob.id), tweet.id).await.unwrap();
    assert!(!view.is_liked);
    assert_eq!(view.like_count, 0);
}

#[tokio::test]
async fn like_on_missing_tweet_is_not_found() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let err = h
        .interactions
        .like_tweet(&alice, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_like_toggles_leave_consistent_state() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let (_, bob) = h.user("bob").await;
    let tweet = h.interactions.create_tweet(&alice, "race", None).await.unwrap();
    let tweet_id = tweet.id;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let interactions = h.interactions.clone();
            let bob = bob.clone();
            tokio::spawn(async move { interactions.like_tweet(&bob, tweet_id).await })
        })
        .collect();

    let mut added = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() == ToggleAction::Added {
            added += 1;
        }
    }

    // Toggles serialize: an even number of them cancels out
    assert_eq!(added, 5);
    let view = h.feed.get_tweet_by_id(None, tweet.id).await.unwrap();
    assert_eq!(view.like_count, 0);
}

#[tokio::test]
async fn follow_toggles_and_reports_status() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let (bob_user, _) = h.user("bob").await;

    assert_eq!(
        h.interactions.follow_user(&alice, bob_user.id).await.unwrap(),
        FollowAction::Followed
    );
    assert!(h.feed.check_follow_status(&alice, bob_user.id).await.unwrap());
    assert!(h.repo.is_following(alice.id, bob_user.id).await.unwrap());
    assert!(!h.repo.is_following(bob_user.id, alice.id).await.unwrap());

    assert_eq!(
        h.interactions.follow_user(&alice, bob_user.id).await.unwrap(),
        FollowAction::Unfollowed
    );
    assert!(!h.feed.check_follow_status(&alice, bob_user.id).await.unwrap());
}

#[tokio::test]
async fn self_follow_is_rejected_and_status_is_false() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;

    let err = h.interactions.follow_user(&alice, alice.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(!h.feed.check_follow_status(&alice, alice.id).await.unwrap());
    assert!(!h.repo.is_following(alice.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn global_feed_excludes_replies() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let (_, bob) = h.user("bob").await;

    let root = h.interactions.create_tweet(&alice, "root", None).await.unwrap();
    let reply = h
        .interactions
        .create_reply_tweet(&bob, root.id, "a reply", None)
        .await
        .unwrap();
    let nested = h
        .interactions
        .create_reply_tweet(&alice, reply.id, "reply to a reply", None)
        .await
        .unwrap();

    let feed = h.feed.get_tweets(None, Page::default()).await.unwrap();
    let ids: Vec<Uuid> = feed.tweets.iter().map(|t| t.detail.tweet.id).collect();
    assert_eq!(ids, vec![root.id]);

    let replies = h
        .feed
        .get_tweet_replies(None, root.id, Page::default())
        .await
        .unwrap();
    let ids: Vec<Uuid> = replies.tweets.iter().map(|t| t.detail.tweet.id).collect();
    assert_eq!(ids, vec![reply.id]);

    let nested_replies = h
        .feed
        .get_tweet_replies(None, reply.id, Page::default())
        .await
        .unwrap();
    assert_eq!(nested_replies.tweets.len(), 1);
    assert_eq!(nested_replies.tweets[0].detail.tweet.id, nested.id);
}

#[tokio::test]
async fn reply_to_missing_parent_is_not_found() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let err = h
        .interactions
        .create_reply_tweet(&alice, Uuid::new_v4(), "orphan", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn user_tweets_are_newest_first_and_paginated() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;

    let mut created = Vec::new();
    for i in 0..5 {
        let tweet = h
            .interactions
            .create_tweet(&alice, &format!("tweet {}", i), None)
            .await
            .unwrap();
        created.push(tweet.id);
    }
    created.reverse();

    let first = h
        .feed
        .get_user_tweets(None, "alice", Page::new(Some(2), None))
        .await
        .unwrap();
    let ids: Vec<Uuid> = first.tweets.iter().map(|t| t.detail.tweet.id).collect();
    assert_eq!(ids, created[..2].to_vec());
    assert!(first.has_more);

    let last = h
        .feed
        .get_user_tweets(None, "alice", Page::new(Some(2), Some(4)))
        .await
        .unwrap();
    let ids: Vec<Uuid> = last.tweets.iter().map(|t| t.detail.tweet.id).collect();
    assert_eq!(ids, created[4..].to_vec());
    assert!(!last.has_more);
}

#[tokio::test]
async fn unknown_username_is_not_found() {
    let h = Harness::new();
    let err = h
        .feed
        .get_user_likes(None, "nobody", Page::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn profile_feed_is_served_from_cache_until_invalidated() {
    let h = Harness::new();
    let (alice_user, _) = h.user("alice").await;

    let empty = h
        .feed
        .get_user_tweets(None, "alice", Page::default())
        .await
        .unwrap();
    assert!(empty.tweets.is_empty());

    // Written behind the service's back: no invalidation event fires
    h.repo
        .insert_tweet(NewTweet {
            author_id: alice_user.id,
            content: "direct".to_string(),
            image_url: None,
            parent_id: None,
        })
        .await
        .unwrap();

    let stale = h
        .feed
        .get_user_tweets(None, "alice", Page::default())
        .await
        .unwrap();
    assert!(stale.tweets.is_empty());

    h.cache.invalidate_feed(ProfileFeed::Tweets).await;

    let fresh = h
        .feed
        .get_user_tweets(None, "alice", Page::default())
        .await
        .unwrap();
    assert_eq!(fresh.tweets.len(), 1);
}

#[tokio::test]
async fn writes_invalidate_the_matching_sub_feed() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let (_, bob) = h.user("bob").await;
    let tweet = h.interactions.create_tweet(&alice, "first", None).await.unwrap();

    // Warm bob's likes and retweets pages
    assert!(h
        .feed
        .get_user_likes(None, "bob", Page::default())
        .await
        .unwrap()
        .tweets
        .is_empty());
    assert!(h
        .feed
        .get_user_retweets(None, "bob", Page::default())
        .await
        .unwrap()
        .tweets
        .is_empty());

    h.interactions.like_tweet(&bob, tweet.id).await.unwrap();
    h.interactions.retweet_tweet(&bob, tweet.id).await.unwrap();

    let likes = h
        .feed
        .get_user_likes(Some(bob.id), "bob", Page::default())
        .await
        .unwrap();
    assert_eq!(likes.tweets.len(), 1);
    assert!(likes.tweets[0].is_liked);

    let retweets = h
        .feed
        .get_user_retweets(Some(alice.id), "bob", Page::default())
        .await
        .unwrap();
    assert_eq!(retweets.tweets.len(), 1);
    assert!(!retweets.tweets[0].is_retweeted);
    assert_eq!(retweets.tweets[0].retweet_count, 1);
}

#[tokio::test]
async fn new_reply_shows_up_in_authors_replies() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let (_, bob) = h.user("bob").await;
    let root = h.interactions.create_tweet(&alice, "root", None).await.unwrap();

    assert!(h
        .feed
        .get_user_replies(None, "bob", Page::default())
        .await
        .unwrap()
        .tweets
        .is_empty());

    h.interactions
        .create_reply_tweet(&bob, root.id, "agreed", None)
        .await
        .unwrap();

    let replies = h
        .feed
        .get_user_replies(None, "bob", Page::default())
        .await
        .unwrap();
    assert_eq!(replies.tweets.len(), 1);
    assert_eq!(replies.tweets[0].detail.tweet.parent_id, Some(root.id));
}

#[tokio::test]
async fn over_long_content_is_rejected() {
    let h = Harness::new();
    let (_, alice) = h.user("alice").await;
    let err = h
        .interactions
        .create_tweet(&alice, &"x".repeat(281), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // Multi-byte characters count once each
    let ok = h
        .interactions
        .create_tweet(&alice, &"é".repeat(280), None)
        .await;
    assert!(ok.is_ok());
}
