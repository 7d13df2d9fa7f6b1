/// Media handler - image uploads proxied to the image host
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::Serialize;

use super::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::response::ApiResponse;
use crate::services::media::MAX_IMAGE_BYTES;
use crate::session::CurrentUser;

/// Body limit for the upload route
pub const MAX_UPLOAD_BODY: usize = MAX_IMAGE_BYTES;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

pub async fn upload_image(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: HttpRequest,
    payload: web::Payload,
) -> ServiceResult<HttpResponse> {
    user.require()?;
    let body = read_limited(payload, MAX_UPLOAD_BODY).await?;

    let uploader = state
        .uploader
        .as_ref()
        .ok_or_else(|| ServiceError::Upstream("image uploads are not configured".to_string()))?;

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let url = uploader.upload(body.to_vec(), content_type).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(UploadResponse { url })))
}

/// Collect the request body, rejecting it as soon as it passes `limit`.
async fn read_limited(mut payload: web::Payload, limit: usize) -> ServiceResult<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(ServiceError::InvalidInput(format!(
                "image exceeds {} bytes",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
