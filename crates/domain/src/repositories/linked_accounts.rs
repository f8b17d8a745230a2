use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::entities::linked_accounts::{InsertLinkedAccountEntity, LinkedAccountEntity};
use crate::value_objects::enums::platforms::Platform;

#[automock]
#[async_trait]
pub trait LinkedAccountRepository {
    /// Create or update the account keyed by (user, platform, handle).
    /// Updates replace token fields in place; a missing refresh token or
    /// expiry in the new data must not clear stored values, and a stored
    /// expiry is never rolled backward.
    async fn upsert_from_oauth(
        &self,
        insert_entity: InsertLinkedAccountEntity,
    ) -> Result<LinkedAccountEntity>;

    /// Most-recently-used active account for (user, platform), if any.
    async fn find_publish_account(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<LinkedAccountEntity>>;

    async fn list_active_for_user(&self, user_id: Uuid) -> Result<Vec<LinkedAccountEntity>>;

    /// Every active account across all users, for the batch collector.
    async fn list_all_active(&self) -> Result<Vec<LinkedAccountEntity>>;

    /// Soft-delete: flips `is_active` off. `account_id = None` disconnects
    /// every account of that platform for the user. Returns rows affected.
    async fn deactivate(
        &self,
        user_id: Uuid,
        platform: Platform,
        account_id: Option<Uuid>,
    ) -> Result<usize>;

    async fn touch_last_used(&self, account_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
