/// Profile service - profile pages and profile edits
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{validation, ProfilePage, ProfileUpdate, User, UserProfile};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::SocialRepository;
use crate::session::Actor;

/// Profile edit as submitted by the owner
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileEdit {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
    pub username: String,
    #[validate(length(max = 160, message = "bio must be at most 160 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 2048))]
    pub avatar: Option<String>,
    /// Banner image, stored in the user's `image` field
    #[validate(length(max = 2048))]
    pub banner: Option<String>,
}

impl ProfileEdit {
    /// Trimmed copy; blank optional fields become `None`
    fn normalized(self) -> Self {
        let trim_opt = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            bio: trim_opt(self.bio),
            avatar: trim_opt(self.avatar),
            banner: trim_opt(self.banner),
        }
    }
}

#[derive(Clone)]
pub struct ProfileService {
    repo: Arc<dyn SocialRepository>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn SocialRepository>) -> Self {
        Self { repo }
    }

    /// User plus live aggregate counts
    pub async fn get_user_profile(&self, username: &str) -> ServiceResult<UserProfile> {
        let user = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;
        let stats = self.repo.user_stats(user.id).await?;
        Ok(UserProfile { user, stats })
    }

    /// Everything the profile header needs, fetched concurrently.
    pub async fn load_profile_page(
        &self,
        viewer: Option<Uuid>,
        username: &str,
    ) -> ServiceResult<ProfilePage> {
        let (profile, is_following) = tokio::join!(
            self.get_user_profile(username),
            self.viewer_follows(viewer, username)
        );

        Ok(ProfilePage {
            profile: profile?,
            is_following: is_following?,
        })
    }

    /// Edit the actor's own profile
    pub async fn update_user_profile(
        &self,
        actor: &Actor,
        edit: ProfileEdit,
    ) -> ServiceResult<User> {
        let edit = edit.normalized();
        edit.validate()?;
        validation::username(&edit.username)?;
        let avatar = validation::image_url(edit.avatar.as_deref())?;
        let banner = validation::image_url(edit.banner.as_deref())?;

        let user = self
            .repo
            .update_user_profile(
                actor.id,
                ProfileUpdate {
                    name: edit.name,
                    username: Some(edit.username),
                    bio: edit.bio,
                    avatar,
                    banner,
                },
            )
            .await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    async fn viewer_follows(&self, viewer: Option<Uuid>, username: &str) -> ServiceResult<bool> {
        let Some(viewer) = viewer else {
            return Ok(false);
        };
        match self.repo.find_user_by_username(username).await? {
            Some(target) if target.id != viewer => self.repo.is_following(viewer, target.id).await,
            _ => Ok(false),
        }
    }
}
