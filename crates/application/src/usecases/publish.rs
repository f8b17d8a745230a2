use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::interfaces::platform::AdapterRegistry;
use domain::entities::post_shares::InsertPostShareEntity;
use domain::entities::posts::InsertPostEntity;
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::repositories::posts::PostRepository;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::publish::{
    ComposePostModel, PostWithShares, PublishReport, ShareOutcome,
};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{0}")]
    Validation(String),

    #[error("An unexpected error occurred.")]
    Internal(#[from] anyhow::Error),
}

/// Publishes one logical post to every requested platform, isolating
/// failures per platform. The Post row is created before any network call
/// so even a total failure leaves an auditable record.
pub struct PublishFanOutUseCase<A, P>
where
    A: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
{
    registry: Arc<AdapterRegistry>,
    linked_account_repository: Arc<A>,
    post_repository: Arc<P>,
}

impl<A, P> PublishFanOutUseCase<A, P>
where
    A: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
{
    pub fn new(
        registry: Arc<AdapterRegistry>,
        linked_account_repository: Arc<A>,
        post_repository: Arc<P>,
    ) -> Self {
        Self {
            registry,
            linked_account_repository,
            post_repository,
        }
    }

    pub async fn publish(
        &self,
        user_id: Uuid,
        compose: ComposePostModel,
    ) -> Result<PublishReport, PublishError> {
        let content = compose.content.trim().to_string();
        if content.is_empty() {
            return Err(PublishError::Validation(
                "Post content must not be empty".to_string(),
            ));
        }
        if compose.platforms.is_empty() {
            return Err(PublishError::Validation(
                "Select at least one platform".to_string(),
            ));
        }

        // Requesting the same platform twice must not produce two shares.
        let mut platforms: Vec<Platform> = Vec::new();
        for platform in compose.platforms {
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }

        let now = Utc::now();
        let post = self
            .post_repository
            .create(InsertPostEntity {
                user_id,
                content: content.clone(),
                media_url: compose.media_url.clone(),
                scheduled_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(%user_id, post_id = %post.id, platform_count = platforms.len(), "publish: fan-out started");

        let mut outcomes: Vec<ShareOutcome> = Vec::new();
        let mut skipped_platforms = Vec::new();

        for platform in platforms {
            let account = match self
                .linked_account_repository
                .find_publish_account(user_id, platform)
                .await
            {
                Ok(Some(account)) => account,
                Ok(None) => {
                    warn!(%user_id, %platform, "publish: no linked account, skipping platform");
                    skipped_platforms.push(platform);
                    continue;
                }
                Err(err) => {
                    error!(%user_id, %platform, db_error = ?err, "publish: account lookup failed, skipping platform");
                    skipped_platforms.push(platform);
                    continue;
                }
            };

            let Some(adapter) = self.registry.get(platform) else {
                error!(%platform, "publish: no adapter registered, skipping platform");
                skipped_platforms.push(platform);
                continue;
            };

            let outcome = match adapter
                .publish(&content, &account.access_token, compose.media_url.as_deref())
                .await
            {
                Ok(success) => {
                    info!(
                        %platform,
                        handle = %account.handle,
                        platform_post_id = %success.platform_post_id,
                        "publish: platform accepted post"
                    );
                    ShareOutcome {
                        platform,
                        handle: account.handle.clone(),
                        is_successful: true,
                        platform_post_id: Some(success.platform_post_id),
                        platform_url: success.platform_url,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!(%platform, handle = %account.handle, error = %err, "publish: platform rejected post");
                    ShareOutcome {
                        platform,
                        handle: account.handle.clone(),
                        is_successful: false,
                        platform_post_id: None,
                        platform_url: None,
                        error: Some(err.to_string()),
                    }
                }
            };

            self.post_repository
                .create_share(InsertPostShareEntity {
                    post_id: post.id,
                    linked_account_id: account.id,
                    platform_post_id: outcome.platform_post_id.clone(),
                    platform_url: outcome.platform_url.clone(),
                    is_successful: outcome.is_successful,
                    error: outcome.error.clone(),
                    shared_at: Utc::now(),
                })
                .await?;

            if let Err(err) = self
                .linked_account_repository
                .touch_last_used(account.id, Utc::now())
                .await
            {
                warn!(account_id = %account.id, db_error = ?err, "publish: failed to bump last_used_at");
            }

            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().any(|outcome| outcome.is_successful);
        if !succeeded {
            warn!(%user_id, post_id = %post.id, "publish: no platform accepted the post");
        }

        Ok(PublishReport {
            post_id: post.id,
            outcomes,
            skipped_platforms,
            succeeded,
        })
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<PostWithShares>, PublishError> {
        let posts = self.post_repository.list_posts_with_shares(user_id).await?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::platform::MockPlatformAdapter;
    use domain::entities::linked_accounts::LinkedAccountEntity;
    use domain::entities::post_shares::PostShareEntity;
    use domain::entities::posts::PostEntity;
    use domain::repositories::linked_accounts::MockLinkedAccountRepository;
    use domain::repositories::posts::MockPostRepository;
    use domain::value_objects::enums::platforms::Platform;
    use domain::value_objects::platform_api::{AdapterError, PublishSuccess};

    fn account(user_id: Uuid, platform: Platform) -> LinkedAccountEntity {
        let now = Utc::now();
        LinkedAccountEntity {
            id: Uuid::new_v4(),
            user_id,
            platform: platform.to_string(),
            account_id: "acct".to_string(),
            handle: format!("{platform}-user"),
            access_token: "token".to_string(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at: None,
            is_active: true,
            is_verified: true,
            created_at: now,
            updated_at: now,
            last_used_at: None,
        }
    }

    fn post(user_id: Uuid) -> PostEntity {
        let now = Utc::now();
        PostEntity {
            id: Uuid::new_v4(),
            user_id,
            content: "hello world".to_string(),
            media_url: None,
            scheduled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn share_from(insert: &InsertPostShareEntity) -> PostShareEntity {
        PostShareEntity {
            id: Uuid::new_v4(),
            post_id: insert.post_id,
            linked_account_id: insert.linked_account_id,
            platform_post_id: insert.platform_post_id.clone(),
            platform_url: insert.platform_url.clone(),
            is_successful: insert.is_successful,
            error: insert.error.clone(),
            shared_at: insert.shared_at,
        }
    }

    fn compose(platforms: Vec<Platform>) -> ComposePostModel {
        ComposePostModel {
            content: "hello world".to_string(),
            media_url: None,
            platforms,
        }
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_any_write() {
        let mut posts = MockPostRepository::new();
        posts.expect_create().times(0);

        let usecase = PublishFanOutUseCase::new(
            Arc::new(AdapterRegistry::new()),
            Arc::new(MockLinkedAccountRepository::new()),
            Arc::new(posts),
        );

        let result = usecase
            .publish(
                Uuid::new_v4(),
                ComposePostModel {
                    content: "   ".to_string(),
                    media_url: None,
                    platforms: vec![Platform::Twitter],
                },
            )
            .await;
        assert!(matches!(result, Err(PublishError::Validation(_))));
    }

    #[tokio::test]
    async fn no_platforms_is_rejected_before_any_write() {
        let mut posts = MockPostRepository::new();
        posts.expect_create().times(0);

        let usecase = PublishFanOutUseCase::new(
            Arc::new(AdapterRegistry::new()),
            Arc::new(MockLinkedAccountRepository::new()),
            Arc::new(posts),
        );

        let result = usecase.publish(Uuid::new_v4(), compose(vec![])).await;
        assert!(matches!(result, Err(PublishError::Validation(_))));
    }

    #[tokio::test]
    async fn one_success_one_failure_records_both_shares() {
        let user_id = Uuid::new_v4();

        let mut twitter = MockPlatformAdapter::new();
        twitter.expect_platform().return_const(Platform::Twitter);
        twitter.expect_publish().times(1).returning(|_, _, _| {
            Ok(PublishSuccess {
                platform_post_id: "111".to_string(),
                platform_url: Some("https://twitter.com/i/web/status/111".to_string()),
            })
        });

        let mut reddit = MockPlatformAdapter::new();
        reddit.expect_platform().return_const(Platform::Reddit);
        reddit.expect_publish().times(1).returning(|_, _, _| {
            Err(AdapterError::Provider {
                status: 500,
                detail: "boom".to_string(),
            })
        });

        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(twitter));
        registry.register(Arc::new(reddit));

        let mut accounts = MockLinkedAccountRepository::new();
        accounts
            .expect_find_publish_account()
            .returning(move |_, platform| Ok(Some(account(user_id, platform))));
        accounts.expect_touch_last_used().returning(|_, _| Ok(()));

        let mut posts = MockPostRepository::new();
        posts
            .expect_create()
            .times(1)
            .returning(move |_| Ok(post(user_id)));
        posts
            .expect_create_share()
            .withf(|insert| insert.is_successful && insert.platform_post_id.as_deref() == Some("111"))
            .times(1)
            .returning(|insert| Ok(share_from(&insert)));
        posts
            .expect_create_share()
            .withf(|insert| !insert.is_successful && insert.error.is_some())
            .times(1)
            .returning(|insert| Ok(share_from(&insert)));

        let usecase = PublishFanOutUseCase::new(
            Arc::new(registry),
            Arc::new(accounts),
            Arc::new(posts),
        );

        let report = usecase
            .publish(user_id, compose(vec![Platform::Twitter, Platform::Reddit]))
            .await
            .unwrap();

        assert!(report.succeeded);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.skipped_platforms.is_empty());
    }

    #[tokio::test]
    async fn platform_without_account_is_skipped_silently() {
        let user_id = Uuid::new_v4();

        let mut accounts = MockLinkedAccountRepository::new();
        accounts
            .expect_find_publish_account()
            .returning(|_, _| Ok(None));

        let mut posts = MockPostRepository::new();
        posts
            .expect_create()
            .times(1)
            .returning(move |_| Ok(post(user_id)));
        posts.expect_create_share().times(0);

        let usecase = PublishFanOutUseCase::new(
            Arc::new(AdapterRegistry::new()),
            Arc::new(accounts),
            Arc::new(posts),
        );

        let report = usecase
            .publish(user_id, compose(vec![Platform::Reddit]))
            .await
            .unwrap();

        assert!(!report.succeeded);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.skipped_platforms, vec![Platform::Reddit]);
    }

    #[tokio::test]
    async fn total_failure_still_keeps_the_post() {
        let user_id = Uuid::new_v4();

        let mut twitter = MockPlatformAdapter::new();
        twitter.expect_platform().return_const(Platform::Twitter);
        twitter.expect_publish().returning(|_, _, _| {
            Err(AdapterError::Transport("timed out".to_string()))
        });

        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(twitter));

        let mut accounts = MockLinkedAccountRepository::new();
        accounts
            .expect_find_publish_account()
            .returning(move |_, platform| Ok(Some(account(user_id, platform))));
        accounts.expect_touch_last_used().returning(|_, _| Ok(()));

        let mut posts = MockPostRepository::new();
        posts
            .expect_create()
            .times(1)
            .returning(move |_| Ok(post(user_id)));
        posts
            .expect_create_share()
            .times(1)
            .returning(|insert| Ok(share_from(&insert)));

        let usecase = PublishFanOutUseCase::new(
            Arc::new(registry),
            Arc::new(accounts),
            Arc::new(posts),
        );

        let report = usecase
            .publish(user_id, compose(vec![Platform::Twitter]))
            .await
            .unwrap();

        assert!(!report.succeeded);
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].is_successful);
    }
}
