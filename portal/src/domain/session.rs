//! Authenticated session: token pair plus the signed-in profile.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::user::User;

/// Bearer token whose `Debug` output never reveals the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the token is blank.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Access and refresh tokens plus the profile they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer token for API calls.
    pub access_token: Token,
    /// Exchanged for a new access token on 401.
    pub refresh_token: Token,
    /// Signed-in profile.
    pub user: User,
}

impl Session {
    /// Assemble a session from raw tokens.
    pub fn new(access: impl Into<String>, refresh: impl Into<String>, user: User) -> Self {
        Self {
            access_token: Token::new(access),
            refresh_token: Token::new(refresh),
            user,
        }
    }

    /// Copy of this session with rotated tokens. A blank refresh token keeps
    /// the current one.
    #[must_use]
    pub fn with_tokens(&self, access: Token, refresh: Option<Token>) -> Self {
        let refresh_token = refresh
            .filter(|token| !token.is_blank())
            .unwrap_or_else(|| self.refresh_token.clone());
        Self {
            access_token: access,
            refresh_token,
            user: self.user.clone(),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    /// The user logged out.
    LoggedOut,
    /// Token refresh failed; the user must sign in again.
    Expired,
}

/// Notification broadcast by session stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// A session was written by this process.
    Updated(Session),
    /// The session was removed by this process.
    Cleared(ClearReason),
    /// Another process changed the persisted session.
    External,
}
