use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use domain::value_objects::analytics::ActivityItem;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::platform_api::{
    AccountMetrics, AdapterError, AuthorizationRequest, PlatformIdentity, PostMetrics,
    PublishSuccess, TokenResult,
};

/// Uniform capability contract one social platform implements. Adding a
/// platform means registering a new adapter; fan-out and aggregation never
/// branch on the platform tag themselves.
#[automock]
#[async_trait]
pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    /// Consent-screen URL carrying the given anti-forgery state, plus the
    /// PKCE verifier to remember server-side when the flow uses one.
    fn build_authorization_request(&self, state: &str) -> AuthorizationRequest;

    /// One-shot: provider authorization codes are single-use, so this is
    /// never retried automatically.
    async fn exchange_code_for_token<'a>(
        &self,
        code: &str,
        code_verifier: Option<&'a str>,
    ) -> Result<TokenResult, AdapterError>;

    async fn fetch_identity(&self, access_token: &str)
        -> Result<PlatformIdentity, AdapterError>;

    async fn publish<'a>(
        &self,
        content: &str,
        access_token: &str,
        media_url: Option<&'a str>,
    ) -> Result<PublishSuccess, AdapterError>;

    async fn fetch_post_metrics(
        &self,
        platform_post_id: &str,
        access_token: &str,
    ) -> Result<PostMetrics, AdapterError>;

    async fn fetch_account_metrics(
        &self,
        access_token: &str,
    ) -> Result<AccountMetrics, AdapterError>;

    /// Recent items already normalized into the common dashboard shape,
    /// scored with the platform's own engagement formula.
    async fn fetch_recent_activity(
        &self,
        access_token: &str,
    ) -> Result<Vec<ActivityItem>, AdapterError>;
}

/// Adapter lookup keyed by platform tag.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter + Send + Sync>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter + Send + Sync>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter + Send + Sync>> {
        self.adapters.get(&platform).map(Arc::clone)
    }
}
