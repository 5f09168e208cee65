use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-success REST response, carrying the server-supplied machine
/// code and optional message.
///
/// The `message` field is the server's text and is NOT user-facing as
/// is; use [`RequestError::display_message`] for display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HTTP {status}: {code}")]
pub struct RequestError {
    pub status: u16,
    pub code: String,
    pub message: Option<String>,
}

impl RequestError {
    pub fn new(status: u16, code: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message,
        }
    }

    /// Build from a status whose body carried no parsable error shape.
    pub fn from_status(status: u16) -> Self {
        let code = match status {
            400 => codes::BAD_REQUEST,
            401 => codes::UNAUTHORIZED,
            404 => codes::NOT_FOUND,
            _ => codes::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, code, None)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Text suitable for display: the mapped text of a known code, or
    /// a generic fallback for unmapped ones.
    pub fn display_message(&self) -> &'static str {
        match AuthErrorCode::from_code(&self.code) {
            Some(code) => code.display_message(),
            None => "Something went wrong, please try again",
        }
    }
}

/// The `{error, message}` body the backend attaches to non-success
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Machine codes the backend emits for authentication failures.
pub mod codes {
    pub const USERNAME_EXISTS: &str = "USERNAME_EXISTS";
    pub const USERNAME_REQUIRED: &str = "USERNAME_REQUIRED";
    pub const USERNAME_INVALID: &str = "USERNAME_INVALID";
    pub const USER_DOES_NOT_EXIST: &str = "USER_DOES_NOT_EXIST";
    pub const PASSWORD_REQUIRED: &str = "PASSWORD_REQUIRED";
    pub const PASSWORD_INVALID: &str = "PASSWORD_INVALID";
    pub const EMAIL_REQUIRED: &str = "EMAIL_REQUIRED";
    pub const EMAIL_INVALID: &str = "EMAIL_INVALID";

    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
}

/// Known authentication error codes with their display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    UsernameExists,
    UsernameRequired,
    UsernameInvalid,
    UserDoesNotExist,
    PasswordRequired,
    PasswordInvalid,
    EmailRequired,
    EmailInvalid,
}

impl AuthErrorCode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            codes::USERNAME_EXISTS => Some(Self::UsernameExists),
            codes::USERNAME_REQUIRED => Some(Self::UsernameRequired),
            codes::USERNAME_INVALID => Some(Self::UsernameInvalid),
            codes::USER_DOES_NOT_EXIST => Some(Self::UserDoesNotExist),
            codes::PASSWORD_REQUIRED => Some(Self::PasswordRequired),
            codes::PASSWORD_INVALID => Some(Self::PasswordInvalid),
            codes::EMAIL_REQUIRED => Some(Self::EmailRequired),
            codes::EMAIL_INVALID => Some(Self::EmailInvalid),
            _ => None,
        }
    }

    pub fn display_message(&self) -> &'static str {
        match self {
            Self::UsernameExists => "Username already exists",
            Self::UsernameRequired => "Username is required",
            Self::UsernameInvalid => "Username is invalid",
            Self::UserDoesNotExist => "User does not exist",
            Self::PasswordRequired => "Password is required",
            Self::PasswordInvalid => "Password is invalid",
            Self::EmailRequired => "Email is required",
            Self::EmailInvalid => "Email is invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_maps_to_display_text() {
        let err = RequestError::new(400, codes::PASSWORD_INVALID, None);
        assert_eq!(err.display_message(), "Password is invalid");
    }

    #[test]
    fn test_unknown_code_falls_back_generically() {
        let err = RequestError::new(418, "TEAPOT", Some("server text".to_string()));
        assert_eq!(err.display_message(), "Something went wrong, please try again");
    }

    #[test]
    fn test_from_status_picks_standard_codes() {
        assert_eq!(RequestError::from_status(404).code, codes::NOT_FOUND);
        assert_eq!(RequestError::from_status(401).code, codes::UNAUTHORIZED);
        assert_eq!(
            RequestError::from_status(503).code,
            codes::INTERNAL_SERVER_ERROR
        );
    }
}
