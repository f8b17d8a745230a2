use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::account_analytics;

/// Account-level snapshot. Append-only: each pull inserts a new row and the
/// latest `collected_at` wins as "current".
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = account_analytics)]
pub struct AccountAnalyticsEntity {
    pub id: Uuid,
    pub linked_account_id: Uuid,
    pub followers: i32,
    pub following: i32,
    pub total_posts: i32,
    pub total_likes: i32,
    pub total_comments: i32,
    pub total_shares: i32,
    pub followers_delta: i32,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_analytics)]
pub struct InsertAccountAnalyticsEntity {
    pub linked_account_id: Uuid,
    pub followers: i32,
    pub following: i32,
    pub total_posts: i32,
    pub total_likes: i32,
    pub total_comments: i32,
    pub total_shares: i32,
    pub followers_delta: i32,
    pub collected_at: DateTime<Utc>,
}
