use chrono::{DateTime, Utc};
use diesel::{AsChangeset, prelude::*};
use uuid::Uuid;

use crate::schema::post_analytics;

/// Latest engagement snapshot for one share. One row per share; pulls
/// overwrite counters in place instead of appending.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = post_analytics)]
pub struct PostAnalyticsEntity {
    pub id: Uuid,
    pub post_share_id: Uuid,
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub views: i32,
    pub impressions: i32,
    pub clicks: i32,
    pub engagement_rate: f64,
    pub collected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = post_analytics)]
pub struct InsertPostAnalyticsEntity {
    pub post_share_id: Uuid,
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub views: i32,
    pub impressions: i32,
    pub clicks: i32,
    pub engagement_rate: f64,
    pub collected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = post_analytics)]
pub struct PostAnalyticsChangeset {
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub views: i32,
    pub impressions: i32,
    pub clicks: i32,
    pub engagement_rate: f64,
    pub updated_at: DateTime<Utc>,
}
