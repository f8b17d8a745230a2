use chrono::{DateTime, Utc};

/// Per-session OAuth scratch state carried between the authorization
/// redirect and its callback. Write-once, read-once, then deleted; taking
/// the entry on first consumption is what makes a replayed callback fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub state: String,
    pub code_verifier: Option<String>,
    pub created_at: DateTime<Utc>,
}
