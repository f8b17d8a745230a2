use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::{
        account_analytics::{AccountAnalyticsEntity, InsertAccountAnalyticsEntity},
        post_analytics::{InsertPostAnalyticsEntity, PostAnalyticsChangeset, PostAnalyticsEntity},
    },
    repositories::analytics::AnalyticsRepository,
    schema::{account_analytics, post_analytics},
};

pub struct AnalyticsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AnalyticsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AnalyticsRepository for AnalyticsPostgres {
    async fn upsert_post_analytics(
        &self,
        insert_entity: InsertPostAnalyticsEntity,
    ) -> Result<PostAnalyticsEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = post_analytics::table
            .filter(post_analytics::post_share_id.eq(insert_entity.post_share_id))
            .first::<PostAnalyticsEntity>(&mut conn)
            .optional()?;

        let Some(existing) = existing else {
            let created = insert_into(post_analytics::table)
                .values(&insert_entity)
                .get_result::<PostAnalyticsEntity>(&mut conn)?;
            return Ok(created);
        };

        // Counters are overwritten in place; collected_at keeps the first
        // collection time.
        let changeset = PostAnalyticsChangeset {
            likes: insert_entity.likes,
            comments: insert_entity.comments,
            shares: insert_entity.shares,
            views: insert_entity.views,
            impressions: insert_entity.impressions,
            clicks: insert_entity.clicks,
            engagement_rate: insert_entity.engagement_rate,
            updated_at: insert_entity.updated_at,
        };

        let updated = update(post_analytics::table)
            .filter(post_analytics::id.eq(existing.id))
            .set(&changeset)
            .get_result::<PostAnalyticsEntity>(&mut conn)?;

        Ok(updated)
    }

    async fn find_post_analytics(
        &self,
        post_share_id: Uuid,
    ) -> Result<Option<PostAnalyticsEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = post_analytics::table
            .filter(post_analytics::post_share_id.eq(post_share_id))
            .first::<PostAnalyticsEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn append_account_analytics(
        &self,
        insert_entity: InsertAccountAnalyticsEntity,
    ) -> Result<AccountAnalyticsEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(account_analytics::table)
            .values(&insert_entity)
            .get_result::<AccountAnalyticsEntity>(&mut conn)?;

        Ok(created)
    }

    async fn latest_account_analytics(
        &self,
        linked_account_id: Uuid,
    ) -> Result<Option<AccountAnalyticsEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = account_analytics::table
            .filter(account_analytics::linked_account_id.eq(linked_account_id))
            .order(account_analytics::collected_at.desc())
            .first::<AccountAnalyticsEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
