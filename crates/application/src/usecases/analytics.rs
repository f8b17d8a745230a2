use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::interfaces::platform::AdapterRegistry;
use domain::entities::account_analytics::InsertAccountAnalyticsEntity;
use domain::entities::linked_accounts::LinkedAccountEntity;
use domain::entities::post_analytics::InsertPostAnalyticsEntity;
use domain::repositories::analytics::AnalyticsRepository;
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::repositories::posts::PostRepository;
use domain::value_objects::analytics::{
    AccountAnalyticsView, ActivityItem, DashboardRankings, PostAnalyticsView, engagement_rate,
    rank_recent, rank_top,
};
use domain::value_objects::enums::platforms::Platform;

/// Outcome counts of one batch collection run. Errors are logged along the
/// way; nothing in a run is fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectReport {
    pub account_snapshots: usize,
    pub post_snapshots: usize,
    pub errors: usize,
}

/// Live-with-fallback metric pulls plus the cross-platform dashboard
/// rankings. Serves both the HTTP dashboard and the batch collector.
pub struct AnalyticsUseCase<L, P, R>
where
    L: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
    R: AnalyticsRepository + Send + Sync,
{
    registry: Arc<AdapterRegistry>,
    linked_account_repository: Arc<L>,
    post_repository: Arc<P>,
    analytics_repository: Arc<R>,
}

impl<L, P, R> AnalyticsUseCase<L, P, R>
where
    L: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
    R: AnalyticsRepository + Send + Sync,
{
    pub fn new(
        registry: Arc<AdapterRegistry>,
        linked_account_repository: Arc<L>,
        post_repository: Arc<P>,
        analytics_repository: Arc<R>,
    ) -> Self {
        Self {
            registry,
            linked_account_repository,
            post_repository,
            analytics_repository,
        }
    }

    pub async fn post_analytics(&self, user_id: Uuid) -> Result<Vec<PostAnalyticsView>> {
        let (views, _, _) = self.pull_post_analytics(Some(user_id)).await?;
        Ok(views)
    }

    pub async fn account_analytics(&self, user_id: Uuid) -> Result<Vec<AccountAnalyticsView>> {
        let (views, _, _) = self.pull_account_analytics(Some(user_id)).await?;
        Ok(views)
    }

    /// Merges every linked account's recent activity and ranks it two ways.
    /// An unreachable provider costs its own items only, never the view.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardRankings> {
        let accounts = self
            .linked_account_repository
            .list_active_for_user(user_id)
            .await?;

        let mut items: Vec<ActivityItem> = Vec::new();
        for account in &accounts {
            let Some((platform, adapter)) = self.adapter_for(account) else {
                continue;
            };

            match adapter.fetch_recent_activity(&account.access_token).await {
                Ok(activity) => items.extend(activity),
                Err(err) => {
                    warn!(
                        %platform,
                        handle = %account.handle,
                        error = %err,
                        "analytics: recent activity fetch failed, omitting platform"
                    );
                }
            }
        }

        Ok(DashboardRankings {
            recent: rank_recent(items.clone()),
            top: rank_top(items),
        })
    }

    /// Batch collection over all users. Both halves run unless one flag
    /// restricts the run; per-item failures are counted, not propagated.
    pub async fn collect(&self, accounts_only: bool, posts_only: bool) -> CollectReport {
        let mut report = CollectReport::default();

        if !posts_only {
            match self.pull_account_analytics(None).await {
                Ok((_, fresh, errors)) => {
                    report.account_snapshots = fresh;
                    report.errors += errors;
                }
                Err(err) => {
                    warn!(error = ?err, "collect: account analytics pass failed");
                    report.errors += 1;
                }
            }
        }

        if !accounts_only {
            match self.pull_post_analytics(None).await {
                Ok((_, fresh, errors)) => {
                    report.post_snapshots = fresh;
                    report.errors += errors;
                }
                Err(err) => {
                    warn!(error = ?err, "collect: post analytics pass failed");
                    report.errors += 1;
                }
            }
        }

        info!(
            account_snapshots = report.account_snapshots,
            post_snapshots = report.post_snapshots,
            errors = report.errors,
            "collect: analytics collection finished"
        );
        report
    }

    /// Returns (views, fresh pull count, error count).
    async fn pull_post_analytics(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<(Vec<PostAnalyticsView>, usize, usize)> {
        let shares = self.post_repository.list_successful_shares(user_id).await?;

        let mut views = Vec::new();
        let mut fresh = 0;
        let mut errors = 0;

        for entry in shares {
            let Some(platform_post_id) = entry.share.platform_post_id.clone() else {
                continue;
            };
            let Some((platform, adapter)) = self.adapter_for(&entry.account) else {
                errors += 1;
                continue;
            };

            match adapter
                .fetch_post_metrics(&platform_post_id, &entry.account.access_token)
                .await
            {
                Ok(metrics) => {
                    let rate = engagement_rate(&metrics);
                    let now = Utc::now();
                    let stored = self
                        .analytics_repository
                        .upsert_post_analytics(InsertPostAnalyticsEntity {
                            post_share_id: entry.share.id,
                            likes: metrics.likes,
                            comments: metrics.comments,
                            shares: metrics.shares,
                            views: metrics.views,
                            impressions: metrics.impressions,
                            clicks: metrics.clicks,
                            engagement_rate: rate,
                            collected_at: now,
                            updated_at: now,
                        })
                        .await?;
                    fresh += 1;
                    views.push(PostAnalyticsView {
                        post_share_id: entry.share.id,
                        platform,
                        handle: entry.account.handle.clone(),
                        platform_post_id,
                        likes: stored.likes,
                        comments: stored.comments,
                        shares: stored.shares,
                        views: stored.views,
                        impressions: stored.impressions,
                        clicks: stored.clicks,
                        engagement_rate: stored.engagement_rate,
                        collected_at: stored.updated_at,
                        from_cache: false,
                    });
                }
                Err(err) => {
                    errors += 1;
                    warn!(
                        %platform,
                        platform_post_id,
                        error = %err,
                        "analytics: live post metrics failed, falling back to snapshot"
                    );
                    // Surface the stored snapshot if one exists; never
                    // fabricate zeros as if they were live numbers.
                    if let Some(cached) = self
                        .analytics_repository
                        .find_post_analytics(entry.share.id)
                        .await?
                    {
                        views.push(PostAnalyticsView {
                            post_share_id: entry.share.id,
                            platform,
                            handle: entry.account.handle.clone(),
                            platform_post_id,
                            likes: cached.likes,
                            comments: cached.comments,
                            shares: cached.shares,
                            views: cached.views,
                            impressions: cached.impressions,
                            clicks: cached.clicks,
                            engagement_rate: cached.engagement_rate,
                            collected_at: cached.updated_at,
                            from_cache: true,
                        });
                    }
                }
            }
        }

        Ok((views, fresh, errors))
    }

    /// Returns (views, fresh pull count, error count).
    async fn pull_account_analytics(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<(Vec<AccountAnalyticsView>, usize, usize)> {
        let accounts = match user_id {
            Some(user_id) => {
                self.linked_account_repository
                    .list_active_for_user(user_id)
                    .await?
            }
            None => self.linked_account_repository.list_all_active().await?,
        };

        let mut views = Vec::new();
        let mut fresh = 0;
        let mut errors = 0;

        for account in accounts {
            let Some((platform, adapter)) = self.adapter_for(&account) else {
                errors += 1;
                continue;
            };

            match adapter.fetch_account_metrics(&account.access_token).await {
                Ok(metrics) => {
                    let previous = self
                        .analytics_repository
                        .latest_account_analytics(account.id)
                        .await?;
                    let followers_delta = previous
                        .map(|row| metrics.followers - row.followers)
                        .unwrap_or(0);

                    let stored = self
                        .analytics_repository
                        .append_account_analytics(InsertAccountAnalyticsEntity {
                            linked_account_id: account.id,
                            followers: metrics.followers,
                            following: metrics.following,
                            total_posts: metrics.total_posts,
                            total_likes: metrics.total_likes,
                            total_comments: metrics.total_comments,
                            total_shares: metrics.total_shares,
                            followers_delta,
                            collected_at: Utc::now(),
                        })
                        .await?;
                    fresh += 1;
                    views.push(AccountAnalyticsView {
                        linked_account_id: account.id,
                        platform,
                        handle: account.handle.clone(),
                        followers: stored.followers,
                        following: stored.following,
                        total_posts: stored.total_posts,
                        followers_delta: stored.followers_delta,
                        collected_at: stored.collected_at,
                        from_cache: false,
                    });
                }
                Err(err) => {
                    errors += 1;
                    warn!(
                        %platform,
                        handle = %account.handle,
                        error = %err,
                        "analytics: live account metrics failed, falling back to snapshot"
                    );
                    if let Some(cached) = self
                        .analytics_repository
                        .latest_account_analytics(account.id)
                        .await?
                    {
                        views.push(AccountAnalyticsView {
                            linked_account_id: account.id,
                            platform,
                            handle: account.handle.clone(),
                            followers: cached.followers,
                            following: cached.following,
                            total_posts: cached.total_posts,
                            followers_delta: cached.followers_delta,
                            collected_at: cached.collected_at,
                            from_cache: true,
                        });
                    }
                }
            }
        }

        Ok((views, fresh, errors))
    }

    fn adapter_for(
        &self,
        account: &LinkedAccountEntity,
    ) -> Option<(Platform, Arc<dyn crate::interfaces::platform::PlatformAdapter + Send + Sync>)>
    {
        let platform = match Platform::from_str(&account.platform) {
            Ok(platform) => platform,
            Err(err) => {
                warn!(
                    account_id = %account.id,
                    platform = %account.platform,
                    error = %err,
                    "analytics: stored account has unknown platform tag"
                );
                return None;
            }
        };

        match self.registry.get(platform) {
            Some(adapter) => Some((platform, adapter)),
            None => {
                warn!(%platform, "analytics: no adapter registered");
                None
            }
        }
    }
}
