use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::value_objects::enums::platforms::Platform;
use crate::value_objects::platform_api::PostMetrics;

/// Both dashboard rankings show at most this many items.
pub const DASHBOARD_ITEM_LIMIT: usize = 6;

/// Engagement rate in percent. Falls back from views to impressions when a
/// platform reports no view count; 0 when neither is available.
pub fn engagement_rate(metrics: &PostMetrics) -> f64 {
    let interactions = (metrics.likes + metrics.comments + metrics.shares) as f64;
    if metrics.views > 0 {
        100.0 * interactions / metrics.views as f64
    } else if metrics.impressions > 0 {
        100.0 * interactions / metrics.impressions as f64
    } else {
        0.0
    }
}

/// One platform activity item normalized into the common dashboard shape.
/// Adapters compute `engagement_score` with their platform's own formula
/// (Twitter: likes+replies+retweets, Reddit: score+comments).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivityItem {
    pub id: String,
    pub platform: Platform,
    pub handle: String,
    pub created_at: DateTime<Utc>,
    pub engagement_score: i64,
}

/// Top items by recency. Recomputed on every dashboard load.
pub fn rank_recent(mut items: Vec<ActivityItem>) -> Vec<ActivityItem> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(DASHBOARD_ITEM_LIMIT);
    items
}

/// Top items by platform-specific engagement score.
pub fn rank_top(mut items: Vec<ActivityItem>) -> Vec<ActivityItem> {
    items.sort_by(|a, b| b.engagement_score.cmp(&a.engagement_score));
    items.truncate(DASHBOARD_ITEM_LIMIT);
    items
}

/// Cross-platform rankings rebuilt from scratch on every dashboard load.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardRankings {
    pub recent: Vec<ActivityItem>,
    pub top: Vec<ActivityItem>,
}

/// Per-share analytics as surfaced to the dashboard. `from_cache` marks
/// numbers served from the stored snapshot after a failed live pull.
#[derive(Debug, Clone, Serialize)]
pub struct PostAnalyticsView {
    pub post_share_id: Uuid,
    pub platform: Platform,
    pub handle: String,
    pub platform_post_id: String,
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub views: i32,
    pub impressions: i32,
    pub clicks: i32,
    pub engagement_rate: f64,
    pub collected_at: DateTime<Utc>,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountAnalyticsView {
    pub linked_account_id: Uuid,
    pub platform: Platform,
    pub handle: String,
    pub followers: i32,
    pub following: i32,
    pub total_posts: i32,
    pub followers_delta: i32,
    pub collected_at: DateTime<Utc>,
    pub from_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metrics(likes: i32, comments: i32, shares: i32, views: i32, impressions: i32) -> PostMetrics {
        PostMetrics {
            likes,
            comments,
            shares,
            views,
            impressions,
            clicks: 0,
        }
    }

    #[test]
    fn engagement_rate_uses_views_when_present() {
        let rate = engagement_rate(&metrics(10, 5, 5, 200, 1000));
        assert_eq!(rate, 100.0 * 20.0 / 200.0);
    }

    #[test]
    fn engagement_rate_falls_back_to_impressions() {
        let rate = engagement_rate(&metrics(3, 1, 0, 0, 400));
        assert_eq!(rate, 100.0 * 4.0 / 400.0);
    }

    #[test]
    fn engagement_rate_is_zero_without_denominator() {
        assert_eq!(engagement_rate(&metrics(7, 2, 1, 0, 0)), 0.0);
    }

    fn item(id: &str, platform: Platform, score: i64, ts: i64) -> ActivityItem {
        ActivityItem {
            id: id.to_string(),
            platform,
            handle: "tester".to_string(),
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            engagement_score: score,
        }
    }

    #[test]
    fn recent_ranking_is_newest_first_and_capped() {
        let items: Vec<ActivityItem> = (0..10)
            .map(|i| item(&i.to_string(), Platform::Twitter, 0, 1_700_000_000 + i))
            .collect();

        let ranked = rank_recent(items);
        assert_eq!(ranked.len(), DASHBOARD_ITEM_LIMIT);
        assert_eq!(ranked[0].id, "9");
        assert_eq!(ranked[5].id, "4");
    }

    #[test]
    fn top_ranking_orders_mixed_platforms_by_score() {
        // Reddit score 10 + 3 comments = 13 beats Twitter 5+1+2 = 8.
        let ranked = rank_top(vec![
            item("tweet", Platform::Twitter, 5 + 1 + 2, 0),
            item("reddit-post", Platform::Reddit, 10 + 3, 0),
        ]);
        assert_eq!(ranked[0].id, "reddit-post");
        assert_eq!(ranked[1].id, "tweet");
    }
}
