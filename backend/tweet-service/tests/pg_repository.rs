//! PostgreSQL gateway tests. Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use tweet_service::domain::{NewTweet, NewUser, Page, ProfileUpdate, ToggleAction, User};
use tweet_service::repository::{PgSocialRepository, SocialRepository};
use tweet_service::ServiceError;

async fn repo() -> PgSocialRepository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to PostgreSQL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    PgSocialRepository::new(pool)
}

async fn user(repo: &PgSocialRepository) -> User {
    // Random suffix keeps runs independent on a shared database
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    repo.insert_user(NewUser {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        username: Some(format!("u_{}", suffix)),
        email: format!("{}@example.com", suffix),
    })
    .await
    .unwrap()
}

async fn tweet(repo: &PgSocialRepository, author: &User, parent_id: Option<Uuid>) -> Uuid {
    repo.insert_tweet(NewTweet {
        author_id: author.id,
        content: "hello".to_string(),
        image_url: None,
        parent_id,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn like_toggle_round_trip() {
    let repo = repo().await;
    let author = user(&repo).await;
    let fan = user(&repo).await;
    let tweet_id = tweet(&repo, &author, None).await;

    assert_eq!(repo.toggle_like(fan.id, tweet_id).await.unwrap(), ToggleAction::Added);
    let detail = repo.find_tweet(tweet_id).await.unwrap().unwrap();
    assert!(detail.is_liked_by(fan.id));
    assert_eq!(detail.author.id, author.id);

    assert_eq!(repo.toggle_like(fan.id, tweet_id).await.unwrap(), ToggleAction::Removed);
    let detail = repo.find_tweet(tweet_id).await.unwrap().unwrap();
    assert!(detail.likes.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn racing_adds_leave_one_row() {
    let repo = repo().await;
    let author = user(&repo).await;
    let fan = user(&repo).await;
    let tweet_id = tweet(&repo, &author, None).await;

    let (a, b) = tokio::join!(
        repo.toggle_retweet(fan.id, tweet_id),
        repo.toggle_retweet(fan.id, tweet_id)
    );
    // Either both observed an empty table, or they serialized
    assert!(a.is_ok() && b.is_ok());

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM retweets WHERE user_id = $1 AND tweet_id = $2")
            .bind(fan.id)
            .bind(tweet_id)
            .fetch_one(repo.pool())
            .await
            .unwrap();
    assert!(count <= 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn missing_targets_are_not_found() {
    let repo = repo().await;
    let someone = user(&repo).await;

    let err = repo.toggle_like(someone.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref e) if e == "tweet"));

    let err = repo
        .insert_tweet(NewTweet {
            author_id: someone.id,
            content: "orphan".to_string(),
            image_url: None,
            parent_id: Some(Uuid::new_v4()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref e) if e == "parent tweet"));

    let err = repo.toggle_follow(someone.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref e) if e == "user"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn stats_and_profile_lists() {
    let repo = repo().await;
    let alice = user(&repo).await;
    let bob = user(&repo).await;

    let root = tweet(&repo, &alice, None).await;
    let reply = tweet(&repo, &alice, Some(root)).await;
    repo.toggle_like(alice.id, root).await.unwrap();
    repo.toggle_follow(bob.id, alice.id).await.unwrap();

    let stats = repo.user_stats(alice.id).await.unwrap();
    assert_eq!(stats.posts_count, 1);
    assert_eq!(stats.replies_count, 1);
    assert_eq!(stats.likes_count, 1);
    assert_eq!(stats.followers_count, 1);
    assert_eq!(stats.following_count, 0);

    let replies = repo.list_user_replies(alice.id, Page::default()).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].tweet.id, reply);

    let liked = repo.list_liked_tweets(alice.id, Page::default()).await.unwrap();
    assert_eq!(liked[0].tweet.id, root);

    assert!(repo.is_following(bob.id, alice.id).await.unwrap());
    assert!(!repo.is_following(alice.id, bob.id).await.unwrap());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn duplicate_username_conflicts() {
    let repo = repo().await;
    let alice = user(&repo).await;
    let bob = user(&repo).await;

    let err = repo
        .update_user_profile(
            bob.id,
            ProfileUpdate {
                name: "Bob".to_string(),
                username: alice.username.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ref m) if m == "username is already taken"));

    let err = repo
        .update_user_profile(
            Uuid::new_v4(),
            ProfileUpdate {
                name: "Ghost".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
