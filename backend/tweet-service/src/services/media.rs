/// Image hosting client
///
/// Forwards user images to the configured upload endpoint as a multipart
/// form (`file`, `upload_preset`) and returns the hosted `secure_url`.
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};

/// Largest accepted image upload
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Clone)]
pub struct ImageUploader {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl ImageUploader {
    pub fn new(upload_url: impl Into<String>, upload_preset: impl Into<String>) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            upload_url: upload_url.into(),
            upload_preset: upload_preset.into(),
        })
    }

    /// Upload one image and return its public https URL.
    pub async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> ServiceResult<String> {
        Self::check(&bytes, content_type)?;
        let size = bytes.len();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(format!("upload.{}", extension_for(content_type)))
            .mime_str(content_type)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Image host rejected upload");
            return Err(ServiceError::Upstream(format!(
                "image host returned {}",
                status
            )));
        }

        let body: UploadResponse = response.json().await?;
        let url = body
            .secure_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ServiceError::Upstream("image host returned no secure_url".to_string()))?;

        info!(bytes = size, url = %url, "Image uploaded");
        Ok(url)
    }

    fn check(bytes: &[u8], content_type: &str) -> ServiceResult<()> {
        if bytes.is_empty() {
            return Err(ServiceError::InvalidInput("image is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ServiceError::InvalidInput(format!(
                "image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }
        if !content_type.starts_with("image/") {
            return Err(ServiceError::InvalidInput(
                "only image uploads are accepted".to_string(),
            ));
        }
        Ok(())
    }
}

fn extension_for(content_type: &str) -> &str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}
