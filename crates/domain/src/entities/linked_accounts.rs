use chrono::{DateTime, Utc};
use diesel::{AsChangeset, prelude::*};
use uuid::Uuid;

use crate::schema::linked_accounts;

/// One social identity bound to one local user. Never hard-deleted;
/// disconnect flips `is_active` and blanks the token columns so historical
/// shares keep their reference without a usable credential behind them.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = linked_accounts)]
pub struct LinkedAccountEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub account_id: String,
    pub handle: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = linked_accounts)]
pub struct InsertLinkedAccountEntity {
    pub user_id: Uuid,
    pub platform: String,
    pub account_id: String,
    pub handle: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Token and identity fields updated on re-link/refresh. `refresh_token`
/// and `expires_at` are `Option` so a provider that reports neither leaves
/// the stored values untouched (diesel skips `None` changeset fields).
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = linked_accounts)]
pub struct TokenRefreshChangeset {
    pub account_id: String,
    pub handle: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_verified: bool,
    pub updated_at: DateTime<Utc>,
}

/// Disconnect blanks the token columns so a deactivated row never keeps a
/// usable credential. `treat_none_as_null` forces the nullable columns to
/// NULL instead of skipping them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = linked_accounts, treat_none_as_null = true)]
pub struct DisconnectChangeset {
    pub is_active: bool,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DisconnectChangeset {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            is_active: false,
            access_token: String::new(),
            refresh_token: None,
            expires_at: None,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_changeset_clears_every_token_field() {
        let now = Utc::now();
        let changeset = DisconnectChangeset::at(now);

        assert!(!changeset.is_active);
        assert!(changeset.access_token.is_empty());
        assert!(changeset.refresh_token.is_none());
        assert!(changeset.expires_at.is_none());
        assert_eq!(changeset.updated_at, now);
    }
}
