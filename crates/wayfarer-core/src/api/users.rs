//! `users/*`: profiles and privacy settings

use super::Api;
use crate::error::{ClientError, ClientResult};
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::{PrivacySettings, ProfileUpdate, User};
use crate::validation::ValidationErrors;

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    /// The signed-in user
    pub async fn me(&self) -> ClientResult<User> {
        self.call(ApiRequest::get("users/me")).await
    }

    pub async fn user(&self, user_id: &str) -> ClientResult<User> {
        self.call(ApiRequest::get(format!("users/{}", id_segment(user_id)?))).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        if update.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("profile", "Nothing to update");
            return Err(ClientError::Validation(errors));
        }
        self.call(ApiRequest::patch("users/me").json(update)?).await
    }

    pub async fn update_privacy(&self, settings: &PrivacySettings) -> ClientResult<PrivacySettings> {
        self.call(ApiRequest::patch("users/me/privacy").json(settings)?)
            .await
    }
}
