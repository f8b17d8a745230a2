use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::oauth::PendingAuthorization;

/// Scratch store for in-flight OAuth handshakes, keyed by the initiating
/// user and platform. Entries are write-once, read-once: `take` removes the
/// entry, so a second callback with the same state finds nothing.
#[automock]
#[async_trait]
pub trait OAuthSessionStore {
    async fn put(
        &self,
        user_id: Uuid,
        platform: Platform,
        pending: PendingAuthorization,
    ) -> Result<()>;

    async fn take(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<PendingAuthorization>>;
}
