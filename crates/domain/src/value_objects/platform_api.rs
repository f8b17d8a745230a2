use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy for outbound platform calls. Every adapter method
/// classifies its failure into exactly one of these; nothing else crosses
/// the adapter boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Provider consent-screen URL plus whatever must survive the redirect
/// server-side. `code_verifier` is set only by PKCE-capable adapters.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub redirect_url: String,
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    /// Lifetime in seconds as reported by the provider; absent means
    /// "does not expire" or "unknown" and must not clobber a stored expiry.
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PlatformIdentity {
    pub account_id: String,
    pub handle: String,
    pub display_name: Option<String>,
}

impl PlatformIdentity {
    /// Placeholder for an account whose identity lookup failed after a
    /// successful token exchange. At most one such row exists per user and
    /// platform; a later verified handshake adopts it.
    pub fn unresolved() -> Self {
        Self {
            account_id: String::new(),
            handle: String::new(),
            display_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishSuccess {
    pub platform_post_id: String,
    pub platform_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostMetrics {
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub views: i32,
    pub impressions: i32,
    pub clicks: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountMetrics {
    pub followers: i32,
    pub following: i32,
    pub total_posts: i32,
    pub total_likes: i32,
    pub total_comments: i32,
    pub total_shares: i32,
}
