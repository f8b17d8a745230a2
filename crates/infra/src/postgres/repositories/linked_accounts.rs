use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::linked_accounts::{
        DisconnectChangeset, InsertLinkedAccountEntity, LinkedAccountEntity, TokenRefreshChangeset,
    },
    repositories::linked_accounts::LinkedAccountRepository,
    schema::linked_accounts,
    value_objects::enums::platforms::Platform,
};

pub struct LinkedAccountPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LinkedAccountPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LinkedAccountRepository for LinkedAccountPostgres {
    async fn upsert_from_oauth(
        &self,
        insert_entity: InsertLinkedAccountEntity,
    ) -> Result<LinkedAccountEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // A verified handshake also adopts the unverified placeholder row
        // left behind by an earlier identity-fetch failure, preferring an
        // exact handle match when both exist.
        let existing = linked_accounts::table
            .filter(linked_accounts::user_id.eq(insert_entity.user_id))
            .filter(linked_accounts::platform.eq(&insert_entity.platform))
            .filter(
                linked_accounts::handle
                    .eq(&insert_entity.handle)
                    .or(linked_accounts::is_verified.eq(false)),
            )
            .order(linked_accounts::is_verified.desc())
            .first::<LinkedAccountEntity>(&mut conn)
            .optional()?;

        let Some(existing) = existing else {
            let created = insert_into(linked_accounts::table)
                .values(&insert_entity)
                .get_result::<LinkedAccountEntity>(&mut conn)?;
            return Ok(created);
        };

        // A stored expiry only moves forward. A token response without an
        // expiry leaves the column alone (None is skipped by the changeset).
        let expires_at = match (existing.expires_at, insert_entity.expires_at) {
            (Some(stored), Some(new)) => Some(stored.max(new)),
            (_, new) => new,
        };

        let changeset = TokenRefreshChangeset {
            account_id: insert_entity.account_id,
            handle: insert_entity.handle,
            access_token: insert_entity.access_token,
            refresh_token: insert_entity.refresh_token,
            token_type: insert_entity.token_type,
            expires_at,
            is_active: true,
            is_verified: insert_entity.is_verified,
            updated_at: Utc::now(),
        };

        let updated = update(linked_accounts::table)
            .filter(linked_accounts::id.eq(existing.id))
            .set(&changeset)
            .get_result::<LinkedAccountEntity>(&mut conn)?;

        Ok(updated)
    }

    async fn find_publish_account(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<LinkedAccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let candidates = linked_accounts::table
            .filter(linked_accounts::user_id.eq(user_id))
            .filter(linked_accounts::platform.eq(platform.to_string()))
            .filter(linked_accounts::is_active.eq(true))
            .load::<LinkedAccountEntity>(&mut conn)?;

        // Never-used accounts sort below any used one.
        let chosen = candidates
            .into_iter()
            .max_by_key(|account| (account.last_used_at, account.created_at));

        Ok(chosen)
    }

    async fn list_active_for_user(&self, user_id: Uuid) -> Result<Vec<LinkedAccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = linked_accounts::table
            .filter(linked_accounts::user_id.eq(user_id))
            .filter(linked_accounts::is_active.eq(true))
            .order(linked_accounts::created_at.asc())
            .load::<LinkedAccountEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_all_active(&self) -> Result<Vec<LinkedAccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = linked_accounts::table
            .filter(linked_accounts::is_active.eq(true))
            .order(linked_accounts::created_at.asc())
            .load::<LinkedAccountEntity>(&mut conn)?;

        Ok(results)
    }

    async fn deactivate(
        &self,
        user_id: Uuid,
        platform: Platform,
        account_id: Option<Uuid>,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Clears the token columns as well; a disconnected row must not
        // keep a usable credential.
        let changes = DisconnectChangeset::at(Utc::now());
        let scope = linked_accounts::table
            .filter(linked_accounts::user_id.eq(user_id))
            .filter(linked_accounts::platform.eq(platform.to_string()))
            .filter(linked_accounts::is_active.eq(true));

        let affected = match account_id {
            Some(account_id) => update(scope.filter(linked_accounts::id.eq(account_id)))
                .set(&changes)
                .execute(&mut conn)?,
            None => update(scope).set(&changes).execute(&mut conn)?,
        };

        Ok(affected)
    }

    async fn touch_last_used(&self, account_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(linked_accounts::table)
            .filter(linked_accounts::id.eq(account_id))
            .set(linked_accounts::last_used_at.eq(at))
            .execute(&mut conn)?;

        Ok(())
    }
}
