//! Boundary validation applied before anything reaches persistence.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ServiceError, ServiceResult};

/// Maximum tweet length in Unicode scalar values
pub const MAX_TWEET_CHARS: usize = 280;
pub const MAX_IMAGE_URL_BYTES: usize = 2048;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]{3,15}$").expect("hardcoded username regex is invalid")
});

/// Validate tweet content and return it trimmed.
pub fn tweet_content(content: &str) -> ServiceResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(
            "tweet content cannot be empty".to_string(),
        ));
    }

    let len = trimmed.chars().count();
    if len > MAX_TWEET_CHARS {
        return Err(ServiceError::InvalidInput(format!(
            "tweet content is {} characters, maximum is {}",
            len, MAX_TWEET_CHARS
        )));
    }

    Ok(trimmed.to_string())
}

/// Validate an optional image reference returned by the image host.
pub fn image_url(url: Option<&str>) -> ServiceResult<Option<String>> {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };

    if url.len() > MAX_IMAGE_URL_BYTES {
        return Err(ServiceError::InvalidInput("image url is too long".to_string()));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ServiceError::InvalidInput(
            "image url must be an http(s) url".to_string(),
        ));
    }

    Ok(Some(url.to_string()))
}

pub fn username(username: &str) -> ServiceResult<()> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(
            "username must be 3-15 letters, digits or underscores".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_at_limit_is_accepted() {
        let content = "a".repeat(MAX_TWEET_CHARS);
        assert_eq!(tweet_content(&content).unwrap().len(), MAX_TWEET_CHARS);
    }

    #[test]
    fn content_over_limit_is_rejected() {
        let content = "a".repeat(MAX_TWEET_CHARS + 1);
        assert!(matches!(
            tweet_content(&content),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn content_limit_counts_characters_not_bytes() {
        // 280 multi-byte characters are still within the limit
        let content = "é".repeat(MAX_TWEET_CHARS);
        assert!(content.len() > MAX_TWEET_CHARS);
        assert!(tweet_content(&content).is_ok());
    }

    #[test]
    fn blank_content_is_rejected() {
        assert!(tweet_content("   \n").is_err());
    }

    #[test]
    fn image_url_rules() {
        assert_eq!(image_url(None).unwrap(), None);
        assert_eq!(image_url(Some("  ")).unwrap(), None);
        assert_eq!(
            image_url(Some("https://res.example.com/a.png")).unwrap(),
            Some("https://res.example.com/a.png".to_string())
        );
        assert!(image_url(Some("javascript:alert(1)")).is_err());
    }

    #[test]
    fn username_shape() {
        assert!(username("ada_99").is_ok());
        assert!(username("ab").is_err());
        assert!(username("has space").is_err());
        assert!(username("much_too_long_username").is_err());
    }
}
