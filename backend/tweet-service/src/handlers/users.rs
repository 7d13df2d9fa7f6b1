/// User handlers - profile pages, profile sub-feeds, follows and profile edits
use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use super::{AppState, PaginationParams};
use crate::domain::FollowAction;
use crate::error::ServiceResult;
use crate::response::ApiResponse;
use crate::services::ProfileEdit;
use crate::session::CurrentUser;

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub action: FollowAction,
}

#[derive(Debug, Serialize)]
pub struct FollowStatusResponse {
    pub is_following: bool,
}

pub async fn get_profile_page(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .profiles
        .load_profile_page(user.viewer_id(), &username)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn get_user_tweets(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .feed
        .get_user_tweets(user.viewer_id(), &username, query.page())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn get_user_replies(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .feed
        .get_user_replies(user.viewer_id(), &username, query.page())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn get_user_likes(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .feed
        .get_user_likes(user.viewer_id(), &username, query.page())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn get_user_retweets(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .feed
        .get_user_retweets(user.viewer_id(), &username, query.page())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

pub async fn follow_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    target_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let action = state
        .interactions
        .follow_user(actor, target_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(FollowResponse { action })))
}

pub async fn follow_status(
    state: web::Data<AppState>,
    user: CurrentUser,
    target_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let is_following = state
        .feed
        .check_follow_status(actor, target_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(FollowStatusResponse { is_following })))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ProfileEdit>,
) -> ServiceResult<HttpResponse> {
    let actor = user.require()?;
    let updated = state
        .profiles
        .update_user_profile(actor, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated)))
}
