/// Tweet handlers - global feed, tweet threads and interactions
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, PaginationParams};
use crate::domain::ToggleAction;
use crate::error::ServiceResult;
use crate::response::ApiResponse;
use crate::session::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct CreateTweetRequest {
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub action: ToggleAction,
}

pub async fn get_tweets(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let page = state.feed.get_tweets(user.viewer_id(), query.page()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn create_tweet(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<CreateTweetRequest>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let tweet = state
        .interactions
        .create_tweet(actor, &body.content, body.image_url.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(tweet)))
}

pub async fn get_tweet(
    state: web::Data<AppState>,
    user: CurrentUser,
    tweet_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let tweet = state
        .feed
        .get_tweet_by_id(user.viewer_id(), tweet_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(tweet)))
}

pub async fn get_replies(
    state: web::Data<AppState>,
    user: CurrentUser,
    tweet_id: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .feed
        .get_tweet_replies(user.viewer_id(), tweet_id.into_inner(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn create_reply(
    state: web::Data<AppState>,
    user: CurrentUser,
    tweet_id: web::Path<Uuid>,
    body: web::Json<CreateTweetRequest>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let reply = state
        .interactions
        .create_reply_tweet(
            actor,
            tweet_id.into_inner(),
            &body.content,
            body.image_url.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(reply)))
}

pub async fn like_tweet(
    state: web::Data<AppState>,
    user: CurrentUser,
    tweet_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let action = state
        .interactions
        .like_tweet(actor, tweet_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(ToggleResponse { action })))
}

pub async fn retweet_tweet(
    state: web::Data<AppState>,
    user: CurrentUser,
    tweet_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let action = state
        .interactions
        .retweet_tweet(actor, tweet_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(ToggleResponse { action })))
}
