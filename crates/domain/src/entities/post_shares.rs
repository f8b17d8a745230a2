use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::post_shares;

/// Outcome of publishing one post to one linked account. Written once per
/// attempt and never mutated afterwards.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = post_shares)]
pub struct PostShareEntity {
    pub id: Uuid,
    pub post_id: Uuid,
    pub linked_account_id: Uuid,
    pub platform_post_id: Option<String>,
    pub platform_url: Option<String>,
    pub is_successful: bool,
    pub error: Option<String>,
    pub shared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = post_shares)]
pub struct InsertPostShareEntity {
    pub post_id: Uuid,
    pub linked_account_id: Uuid,
    pub platform_post_id: Option<String>,
    pub platform_url: Option<String>,
    pub is_successful: bool,
    pub error: Option<String>,
    pub shared_at: DateTime<Utc>,
}
