use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::post_shares::{InsertPostShareEntity, PostShareEntity};
use crate::entities::posts::{InsertPostEntity, PostEntity};
use crate::value_objects::publish::{PostWithShares, ShareWithAccount};

#[automock]
#[async_trait]
pub trait PostRepository {
    async fn create(&self, insert_entity: InsertPostEntity) -> Result<PostEntity>;

    async fn create_share(&self, insert_entity: InsertPostShareEntity) -> Result<PostShareEntity>;

    /// A user's posts, newest first, each with its per-platform outcomes.
    async fn list_posts_with_shares(&self, user_id: Uuid) -> Result<Vec<PostWithShares>>;

    /// Successful shares that have a platform post id, joined with their
    /// account. `user_id = None` spans all users (batch collector).
    async fn list_successful_shares(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ShareWithAccount>>;
}
