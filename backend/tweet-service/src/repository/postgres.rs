use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::SocialRepository;
use crate::domain::{
    AuthorSummary, Engagement, NewTweet, NewUser, Page, ProfileUpdate, ToggleAction, Tweet,
    TweetDetail, User, UserStats,
};
use crate::error::{ServiceError, ServiceResult};

const USER_COLUMNS: &str =
    "id, name, username, email, bio, avatar, image, created_at, updated_at";

const TWEET_COLUMNS: &str = r#"
    t.id, t.content, t.image_url, t.parent_id, t.author_id, t.created_at,
    u.name AS author_name, u.username AS author_username, u.avatar AS author_avatar
"#;

/// Join table with a unique (left, right) pair
struct JoinTable {
    table: &'static str,
    left: &'static str,
    right: &'static str,
}

const LIKES: JoinTable = JoinTable {
    table: "likes",
    left: "user_id",
    right: "tweet_id",
};

const RETWEETS: JoinTable = JoinTable {
    table: "retweets",
    left: "user_id",
    right: "tweet_id",
};

const FOLLOWS: JoinTable = JoinTable {
    table: "follows",
    left: "follower_id",
    right: "following_id",
};

#[derive(sqlx::FromRow)]
struct TweetRow {
    id: Uuid,
    content: String,
    image_url: Option<String>,
    parent_id: Option<Uuid>,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    author_name: String,
    author_username: Option<String>,
    author_avatar: Option<String>,
}

#[derive(sqlx::FromRow)]
struct EngagementRow {
    id: Uuid,
    user_id: Uuid,
    tweet_id: Uuid,
}

/// Name the entity a foreign-key violation points at.
fn referenced_entity(err: &sqlx::Error) -> &'static str {
    let constraint = match err {
        sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or_default(),
        _ => "",
    };

    if constraint.contains("parent_id") {
        "parent tweet"
    } else if constraint.contains("tweet_id") {
        "tweet"
    } else {
        "user"
    }
}

fn classify(err: sqlx::Error) -> ServiceError {
    let entity = referenced_entity(&err);
    ServiceError::from_sqlx(err, entity)
}

/// PostgreSQL persistence gateway (source of truth)
#[derive(Clone)]
pub struct PgSocialRepository {
    pool: PgPool,
}

impl PgSocialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_details(
        &self,
        sql: &str,
        key: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let rows = sqlx::query_as::<_, TweetRow>(sql)
            .bind(key)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    /// Attach like and retweet collections to a batch of tweet rows.
    async fn hydrate(&self, rows: Vec<TweetRow>) -> ServiceResult<Vec<TweetDetail>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut likes = self.load_engagements(&LIKES, &ids).await?;
        let mut retweets = self.load_engagements(&RETWEETS, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| TweetDetail {
                likes: likes.remove(&row.id).unwrap_or_default(),
                retweets: retweets.remove(&row.id).unwrap_or_default(),
                author: AuthorSummary {
                    id: row.author_id,
                    name: row.author_name,
                    username: row.author_username,
                    avatar: row.author_avatar,
                },
                tweet: Tweet {
                    id: row.id,
                    content: row.content,
                    image_url: row.image_url,
                    parent_id: row.parent_id,
                    author_id: row.author_id,
                    created_at: row.created_at,
                },
            })
            .collect())
    }

    async fn load_engagements(
        &self,
        join: &JoinTable,
        tweet_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, Vec<Engagement>>> {
        let sql = format!(
            "SELECT id, user_id, tweet_id FROM {} WHERE tweet_id = ANY($1) ORDER BY created_at",
            join.table
        );
        let rows = sqlx::query_as::<_, EngagementRow>(&sql)
            .bind(tweet_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<Engagement>> = HashMap::new();
        for row in rows {
            grouped.entry(row.tweet_id).or_default().push(Engagement {
                id: row.id,
                user_id: row.user_id,
            });
        }
        Ok(grouped)
    }

    /// Delete-or-insert inside one transaction. A concurrent duplicate insert
    /// is absorbed by `ON CONFLICT DO NOTHING`, so racing "add" toggles both
    /// observe `Added` and leave a single row.
    async fn toggle(&self, join: &JoinTable, left: Uuid, right: Uuid) -> ServiceResult<ToggleAction> {
        let mut tx = self.pool.begin().await?;

        let delete_sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            join.table, join.left, join.right
        );
        let removed = sqlx::query(&delete_sql)
            .bind(left)
            .bind(right)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let action = if removed > 0 {
            ToggleAction::Removed
        } else {
            let insert_sql = format!(
                "INSERT INTO {table} (id, {l}, {r}, created_at) VALUES ($1, $2, $3, NOW()) \
                 ON CONFLICT ({l}, {r}) DO NOTHING",
                table = join.table,
                l = join.left,
                r = join.right
            );
            sqlx::query(&insert_sql)
                .bind(Uuid::new_v4())
                .bind(left)
                .bind(right)
                .execute(&mut *tx)
                .await
                .map_err(classify)?;
            ToggleAction::Added
        };

        tx.commit().await?;

        debug!(
            table = join.table,
            %left,
            %right,
            action = action.as_str(),
            "toggled join row"
        );
        Ok(action)
    }
}

#[async_trait::async_trait]
impl SocialRepository for PgSocialRepository {
    async fn insert_user(&self, user: NewUser) -> ServiceResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, username, email, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(user.name)
            .bind(user.username)
            .bind(user.email)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2,
                username = COALESCE($3, username),
                bio = COALESCE($4, bio),
                avatar = COALESCE($5, avatar),
                image = COALESCE($6, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(update.name)
            .bind(update.username)
            .bind(update.bio)
            .bind(update.avatar)
            .bind(update.banner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict("username is already taken".to_string())
                }
                other => other,
            })?;

        user.ok_or_else(|| ServiceError::NotFound("user".to_string()))
    }

    async fn user_stats(&self, user_id: Uuid) -> ServiceResult<UserStats> {
        let (posts, replies, likes, retweets, followers, following): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tweets WHERE author_id = $1 AND parent_id IS NULL),
                (SELECT COUNT(*) FROM tweets WHERE author_id = $1 AND parent_id IS NOT NULL),
                (SELECT COUNT(*) FROM likes WHERE user_id = $1),
                (SELECT COUNT(*) FROM retweets WHERE user_id = $1),
                (SELECT COUNT(*) FROM follows WHERE following_id = $1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            posts_count: posts,
            replies_count: replies,
            likes_count: likes,
            retweets_count: retweets,
            followers_count: followers,
            following_count: following,
        })
    }

    async fn insert_tweet(&self, tweet: NewTweet) -> ServiceResult<Tweet> {
        let tweet = sqlx::query_as::<_, Tweet>(
            r#"
            INSERT INTO tweets (id, content, image_url, parent_id, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, content, image_url, parent_id, author_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tweet.content)
        .bind(tweet.image_url)
        .bind(tweet.parent_id)
        .bind(tweet.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(tweet)
    }

    async fn find_tweet(&self, tweet_id: Uuid) -> ServiceResult<Option<TweetDetail>> {
        let sql = format!(
            "SELECT {} FROM tweets t JOIN users u ON u.id = t.author_id WHERE t.id = $1",
            TWEET_COLUMNS
        );
        let row = sqlx::query_as::<_, TweetRow>(&sql)
            .bind(tweet_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_feed(&self, page: Page) -> ServiceResult<Vec<TweetDetail>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tweets t
            JOIN users u ON u.id = t.author_id
            WHERE t.parent_id IS NULL
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $1 OFFSET $2
            "#,
            TWEET_COLUMNS
        );
        let rows = sqlx::query_as::<_, TweetRow>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn list_replies(&self, parent_id: Uuid, page: Page) -> ServiceResult<Vec<TweetDetail>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tweets t
            JOIN users u ON u.id = t.author_id
            WHERE t.parent_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
            TWEET_COLUMNS
        );
        self.fetch_details(&sql, parent_id, page).await
    }

    async fn list_user_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tweets t
            JOIN users u ON u.id = t.author_id
            WHERE t.author_id = $1 AND t.parent_id IS NULL
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
            TWEET_COLUMNS
        );
        self.fetch_details(&sql, user_id, page).await
    }

    async fn list_user_replies(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tweets t
            JOIN users u ON u.id = t.author_id
            WHERE t.author_id = $1 AND t.parent_id IS NOT NULL
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
            TWEET_COLUMNS
        );
        self.fetch_details(&sql, user_id, page).await
    }

    async fn list_liked_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM likes l
            JOIN tweets t ON t.id = l.tweet_id
            JOIN users u ON u.id = t.author_id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $2 OFFSET $3
            "#,
            TWEET_COLUMNS
        );
        self.fetch_details(&sql, user_id, page).await
    }

    async fn list_retweeted_tweets(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Vec<TweetDetail>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM retweets r
            JOIN tweets t ON t.id = r.tweet_id
            JOIN users u ON u.id = t.author_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            "#,
            TWEET_COLUMNS
        );
        self.fetch_details(&sql, user_id, page).await
    }

    async fn toggle_like(&self, user_id: Uuid, tweet_id: Uuid) -> ServiceResult<ToggleAction> {
        self.toggle(&LIKES, user_id, tweet_id).await
    }

    async fn toggle_retweet(&self, user_id: Uuid, tweet_id: Uuid) -> ServiceResult<ToggleAction> {
        self.toggle(&RETWEETS, user_id, tweet_id).await
    }

    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> ServiceResult<ToggleAction> {
        self.toggle(&FOLLOWS, follower_id, following_id).await
    }

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows
                WHERE follower_id = $1 AND following_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn health_check(&self) -> ServiceResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
