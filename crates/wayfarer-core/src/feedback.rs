//! User-facing feedback for failed or finished actions

use std::time::Duration;

use crate::error::ClientError;

/// Shown when the server gave no usable message
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Shown when a photo could not be decoded or composited
pub const IMAGE_ERROR_MESSAGE: &str = "Failed to process image";

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// How long a toast stays on screen
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

/// Transient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }

    /// Error toast for a failed action.
    ///
    /// Backend failures show the server's message when it sent one.
    /// Validation failures are rendered inline, so their toast only points
    /// at the form.
    pub fn from_error(error: &ClientError) -> Self {
        let message = match error {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Unauthorized(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            ClientError::Compose(_) => IMAGE_ERROR_MESSAGE.to_string(),
            ClientError::Validation(errors) => match errors.iter().next() {
                Some((_, first)) => first.to_string(),
                None => GENERIC_ERROR_MESSAGE.to_string(),
            },
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        };
        Self::error(message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == ToastKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ApiResponse;
    use crate::validation::ValidationErrors;

    #[test]
    fn test_server_message_is_used() {
        let toast = Toast::from_error(&ClientError::Api {
            status: 409,
            message: Some("You already follow this traveler".into()),
        });
        assert!(toast.is_error());
        assert_eq!(toast.message, "You already follow this traveler");
    }

    #[test]
    fn test_missing_server_message_falls_back() {
        for response in [
            ApiResponse::new(500, "<html>oops</html>"),
            ApiResponse::json(502, &serde_json::json!({ "code": 502 })),
            ApiResponse::json(500, &serde_json::json!({ "message": "" })),
        ] {
            let err = response.error_for_status().unwrap_err();
            assert_eq!(Toast::from_error(&err).message, GENERIC_ERROR_MESSAGE);
        }
    }

    #[test]
    fn test_server_message_survives_status_check() {
        let err = ApiResponse::json(409, &serde_json::json!({ "message": "Already connected" }))
            .error_for_status()
            .unwrap_err();
        assert_eq!(Toast::from_error(&err).message, "Already connected");
    }

    #[test]
    fn test_non_api_errors_use_generic() {
        for err in [
            ClientError::Network("connection reset".into()),
            ClientError::UnexpectedResponse("html".into()),
            ClientError::Storage("locked".into()),
        ] {
            assert_eq!(Toast::from_error(&err).message, GENERIC_ERROR_MESSAGE);
        }
    }

    #[test]
    fn test_compose_and_session_messages() {
        assert_eq!(
            Toast::from_error(&ClientError::Compose("decode".into())).message,
            IMAGE_ERROR_MESSAGE
        );
        assert_eq!(
            Toast::from_error(&ClientError::Unauthorized("401".into())).message,
            SESSION_EXPIRED_MESSAGE
        );
    }

    #[test]
    fn test_validation_shows_first_field() {
        let mut errors = ValidationErrors::new();
        errors.add("password", "Password is required");
        errors.add("email", "Enter a valid email address");
        let toast = Toast::from_error(&ClientError::Validation(errors));
        assert_eq!(toast.message, "Enter a valid email address");
        assert_eq!(toast.duration, DEFAULT_TOAST_DURATION);
    }
}
