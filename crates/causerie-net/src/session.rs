//! Authentication endpoints.

use serde::{Deserialize, Serialize};

use causerie_shared::User;

use crate::error::{NetError, Result};
use crate::rest::RestClient;

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Response of a successful `POST /auth/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

impl RestClient {
    /// Create a session and persist the returned bearer credential.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let res: SessionResponse = self
            .post("/auth/sessions", &LoginRequest { username, password })
            .await?;

        self.tokens().save(&res.token)?;
        tracing::info!(user = %res.user.id, "Session created");
        Ok(res.user)
    }

    /// Session check.  `Ok(None)` means the credential is missing,
    /// expired, or otherwise not attached to a valid user — the
    /// recoverable "please log in" state, not a failure.
    pub async fn current_user(&self) -> Result<Option<User>> {
        match self.get::<Option<User>>("/users").await {
            Ok(user) => Ok(user),
            Err(NetError::Request(err)) if err.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
