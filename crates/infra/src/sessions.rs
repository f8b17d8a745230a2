use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use application::interfaces::oauth_sessions::OAuthSessionStore;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::oauth::PendingAuthorization;

/// Process-local session store. Handshakes are short-lived and a restart
/// invalidating them is acceptable; the user just reconnects.
#[derive(Default)]
pub struct InMemoryOAuthSessionStore {
    pending: Mutex<HashMap<(Uuid, Platform), PendingAuthorization>>,
}

impl InMemoryOAuthSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OAuthSessionStore for InMemoryOAuthSessionStore {
    async fn put(
        &self,
        user_id: Uuid,
        platform: Platform,
        pending: PendingAuthorization,
    ) -> Result<()> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| anyhow::anyhow!("oauth session store lock poisoned"))?;
        guard.insert((user_id, platform), pending);
        Ok(())
    }

    async fn take(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<PendingAuthorization>> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| anyhow::anyhow!("oauth session store lock poisoned"))?;
        Ok(guard.remove(&(user_id, platform)))
    }
}
