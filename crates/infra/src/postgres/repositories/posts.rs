use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::{
        linked_accounts::LinkedAccountEntity,
        post_shares::{InsertPostShareEntity, PostShareEntity},
        posts::{InsertPostEntity, PostEntity},
    },
    repositories::posts::PostRepository,
    schema::{linked_accounts, post_shares, posts},
    value_objects::publish::{PostWithShares, ShareWithAccount},
};

pub struct PostPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PostPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PostRepository for PostPostgres {
    async fn create(&self, insert_entity: InsertPostEntity) -> Result<PostEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(posts::table)
            .values(&insert_entity)
            .get_result::<PostEntity>(&mut conn)?;

        Ok(created)
    }

    async fn create_share(
        &self,
        insert_entity: InsertPostShareEntity,
    ) -> Result<PostShareEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(post_shares::table)
            .values(&insert_entity)
            .get_result::<PostShareEntity>(&mut conn)?;

        Ok(created)
    }

    async fn list_posts_with_shares(&self, user_id: Uuid) -> Result<Vec<PostWithShares>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let post_rows = posts::table
            .filter(posts::user_id.eq(user_id))
            .order(posts::created_at.desc())
            .load::<PostEntity>(&mut conn)?;

        let post_ids: Vec<Uuid> = post_rows.iter().map(|post| post.id).collect();
        let share_rows = post_shares::table
            .filter(post_shares::post_id.eq_any(&post_ids))
            .order(post_shares::shared_at.asc())
            .load::<PostShareEntity>(&mut conn)?;

        let results = post_rows
            .into_iter()
            .map(|post| {
                let shares = share_rows
                    .iter()
                    .filter(|share| share.post_id == post.id)
                    .cloned()
                    .collect();
                PostWithShares { post, shares }
            })
            .collect();

        Ok(results)
    }

    async fn list_successful_shares(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ShareWithAccount>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = post_shares::table
            .inner_join(
                linked_accounts::table
                    .on(post_shares::linked_account_id.eq(linked_accounts::id)),
            )
            .select((PostShareEntity::as_select(), LinkedAccountEntity::as_select()))
            .filter(post_shares::is_successful.eq(true))
            .filter(post_shares::platform_post_id.is_not_null())
            .into_boxed();

        if let Some(user_id) = user_id {
            query = query.filter(linked_accounts::user_id.eq(user_id));
        }

        let rows = query
            .order(post_shares::shared_at.desc())
            .load::<(PostShareEntity, LinkedAccountEntity)>(&mut conn)?;

        let results = rows
            .into_iter()
            .map(|(share, account)| ShareWithAccount { share, account })
            .collect();

        Ok(results)
    }
}
