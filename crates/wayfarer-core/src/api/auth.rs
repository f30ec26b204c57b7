//! `auth/*`: sign in, sign up, email verification and password reset

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::Api;
use crate::auth::{LogoutReason, TokenKind, TokenPair};
use crate::error::{ClientError, ClientResult};
use crate::storage::CredentialStore;
use crate::transport::{ApiRequest, HttpTransport};
use crate::types::User;
use crate::validation::{validate_login, validate_password_reset, validate_registration};

/// `data.attributes` of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Sign-up form
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OneTimeToken {
    #[serde(default)]
    verification_token: Option<String>,
    #[serde(default)]
    reset_password_token: Option<String>,
}

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    /// Sign in and persist the token pair
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        validate_login(email, password).into_result()?;
        let request = ApiRequest::post("auth/login")
            .public()
            .json(&json!({ "email": email.trim(), "password": password }))?;
        let session: AuthSession = self.call(request).await?;
        self.client.begin_session(&session.tokens)?;
        info!(user_id = %session.user.id, "Logged in");
        Ok(session.user)
    }

    /// Create an account. The verification token, when the server hands one
    /// out, is kept for [`Api::verify_email`].
    pub async fn register(&self, form: &Registration) -> ClientResult<Option<String>> {
        validate_registration(
            &form.first_name,
            &form.last_name,
            &form.email,
            &form.password,
            &form.confirm_password,
        )
        .into_result()?;

        let request = ApiRequest::post("auth/register").public().json(&json!({
            "firstName": form.first_name.trim(),
            "lastName": form.last_name.trim(),
            "email": form.email.trim(),
            "password": form.password,
        }))?;
        let response = self.send(request).await?;
        self.keep_one_time_tokens(&response.body)?;
        response.ack()
    }

    /// Confirm the email address with the code from the verification mail
    pub async fn verify_email(&self, code: &str) -> ClientResult<Option<String>> {
        if self.client.store().token(TokenKind::EmailVerification)?.is_none() {
            return Err(ClientError::Unauthorized(
                "verification link expired, sign up again".into(),
            ));
        }
        let request = ApiRequest::post("auth/verify-email")
            .with_token(TokenKind::EmailVerification)
            .json(&json!({ "code": code.trim() }))?;
        let message = self.call_ack(request).await?;
        self.client.store().remove_token(TokenKind::EmailVerification)?;
        Ok(message)
    }

    /// Request a password reset mail
    pub async fn forgot_password(&self, email: &str) -> ClientResult<Option<String>> {
        if !crate::validation::is_valid_email(email) {
            let mut errors = crate::validation::ValidationErrors::new();
            errors.add("email", "Enter a valid email address");
            return Err(ClientError::Validation(errors));
        }
        let request = ApiRequest::post("auth/forgot-password")
            .public()
            .json(&json!({ "email": email.trim() }))?;
        let response = self.send(request).await?;
        self.keep_one_time_tokens(&response.body)?;
        response.ack()
    }

    /// Set a new password using the stored reset token
    pub async fn reset_password(
        &self,
        code: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<Option<String>> {
        validate_password_reset(password, confirm_password).into_result()?;
        let request = ApiRequest::post("auth/reset-password")
            .with_token(TokenKind::ResetPassword)
            .json(&json!({ "code": code.trim(), "password": password }))?;
        let message = self.call_ack(request).await?;
        self.client.store().remove_token(TokenKind::ResetPassword)?;
        Ok(message)
    }

    /// Tell the server, then clear local credentials regardless of its answer
    pub async fn logout(&self) -> ClientResult<()> {
        if self.client.store().token(TokenKind::Access)?.is_some() {
            if let Err(e) = self.send(ApiRequest::post("auth/logout")).await {
                warn!(error = %e, "Server-side logout failed");
            }
        }
        self.client.logout(LogoutReason::UserRequested)
    }

    fn keep_one_time_tokens(&self, body: &[u8]) -> ClientResult<()> {
        let Ok(envelope) = crate::types::decode_envelope::<OneTimeToken>(body) else {
            return Ok(());
        };
        let Some(data) = envelope.data else {
            return Ok(());
        };
        let store = self.client.store();
        if let Some(token) = data.attributes.verification_token {
            store.save_token(TokenKind::EmailVerification, &token, self.one_time_ttl)?;
        }
        if let Some(token) = data.attributes.reset_password_token {
            store.save_token(TokenKind::ResetPassword, &token, self.one_time_ttl)?;
        }
        Ok(())
    }
}
