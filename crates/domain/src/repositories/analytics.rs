use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::account_analytics::{AccountAnalyticsEntity, InsertAccountAnalyticsEntity};
use crate::entities::post_analytics::{InsertPostAnalyticsEntity, PostAnalyticsEntity};

#[automock]
#[async_trait]
pub trait AnalyticsRepository {
    /// One row per share: creates it on first pull, afterwards overwrites
    /// every counter and the engagement rate in place (`collected_at` keeps
    /// the first collection time, `updated_at` tracks the latest pull).
    async fn upsert_post_analytics(
        &self,
        insert_entity: InsertPostAnalyticsEntity,
    ) -> Result<PostAnalyticsEntity>;

    async fn find_post_analytics(
        &self,
        post_share_id: Uuid,
    ) -> Result<Option<PostAnalyticsEntity>>;

    /// Append-only history; never updates an existing row.
    async fn append_account_analytics(
        &self,
        insert_entity: InsertAccountAnalyticsEntity,
    ) -> Result<AccountAnalyticsEntity>;

    async fn latest_account_analytics(
        &self,
        linked_account_id: Uuid,
    ) -> Result<Option<AccountAnalyticsEntity>>;
}
