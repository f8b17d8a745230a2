use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::interfaces::oauth_sessions::OAuthSessionStore;
use crate::interfaces::platform::AdapterRegistry;
use domain::entities::linked_accounts::{InsertLinkedAccountEntity, LinkedAccountEntity};
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::oauth::PendingAuthorization;
use domain::value_objects::platform_api::PlatformIdentity;

/// Bytes of entropy behind the anti-forgery state token (32 bytes, well
/// above the 16-byte floor).
const STATE_TOKEN_BYTES: usize = 32;

/// One human-readable failure per connector state; provider status codes
/// and bodies go to the logs, never to the end user.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Unsupported platform")]
    UnsupportedPlatform,

    #[error("Invalid state parameter. Please try again.")]
    StateMismatch,

    #[error("Missing authorization code.")]
    MissingCode,

    #[error("Failed to obtain an access token from the provider.")]
    TokenExchange,

    #[error("An unexpected error occurred.")]
    Internal(#[from] anyhow::Error),
}

/// Drives the authorization-code handshake for one platform adapter and
/// upserts the resulting linked account.
pub struct OAuthConnectUseCase<A, S>
where
    A: LinkedAccountRepository + Send + Sync,
    S: OAuthSessionStore + Send + Sync,
{
    registry: Arc<AdapterRegistry>,
    linked_account_repository: Arc<A>,
    session_store: Arc<S>,
}

impl<A, S> OAuthConnectUseCase<A, S>
where
    A: LinkedAccountRepository + Send + Sync,
    S: OAuthSessionStore + Send + Sync,
{
    pub fn new(
        registry: Arc<AdapterRegistry>,
        linked_account_repository: Arc<A>,
        session_store: Arc<S>,
    ) -> Self {
        Self {
            registry,
            linked_account_repository,
            session_store,
        }
    }

    /// Starts the handshake: generates the state token, lets the adapter
    /// build its consent URL (and PKCE verifier, if it uses one), and parks
    /// both in the session store until the callback arrives.
    pub async fn begin(&self, user_id: Uuid, platform: Platform) -> Result<String, ConnectError> {
        let adapter = self
            .registry
            .get(platform)
            .ok_or(ConnectError::UnsupportedPlatform)?;

        let state = generate_state_token();
        let authorization = adapter.build_authorization_request(&state);

        self.session_store
            .put(
                user_id,
                platform,
                PendingAuthorization {
                    state,
                    code_verifier: authorization.code_verifier,
                    created_at: Utc::now(),
                },
            )
            .await?;

        info!(%user_id, %platform, "oauth_connect: authorization started");
        Ok(authorization.redirect_url)
    }

    /// Finishes the handshake. The pending entry is consumed up front, so a
    /// replayed callback (double-click, history revisit) fails the state
    /// check instead of double-linking.
    pub async fn complete(
        &self,
        user_id: Uuid,
        platform: Platform,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<LinkedAccountEntity, ConnectError> {
        let adapter = self
            .registry
            .get(platform)
            .ok_or(ConnectError::UnsupportedPlatform)?;

        let Some(pending) = self.session_store.take(user_id, platform).await? else {
            warn!(%user_id, %platform, "oauth_connect: callback without pending handshake");
            return Err(ConnectError::StateMismatch);
        };

        if state != Some(pending.state.as_str()) {
            warn!(%user_id, %platform, "oauth_connect: state mismatch, possible CSRF or replay");
            return Err(ConnectError::StateMismatch);
        }

        let code = code.ok_or(ConnectError::MissingCode)?;

        let token = adapter
            .exchange_code_for_token(code, pending.code_verifier.as_deref())
            .await
            .map_err(|err| {
                warn!(%user_id, %platform, error = %err, "oauth_connect: token exchange failed");
                ConnectError::TokenExchange
            })?;

        // The token is already valid even if the identity lookup fails, so
        // the account is linked either way. An unverified link keeps the
        // token; the identity fills in on the next successful handshake.
        let (identity, is_verified) = match adapter.fetch_identity(&token.access_token).await {
            Ok(identity) => (identity, true),
            Err(err) => {
                warn!(%user_id, %platform, error = %err, "oauth_connect: identity fetch failed, linking unverified");
                (PlatformIdentity::unresolved(), false)
            }
        };

        let now = Utc::now();
        let expires_at = token.expires_in.map(|secs| now + Duration::seconds(secs));

        let account = self
            .linked_account_repository
            .upsert_from_oauth(InsertLinkedAccountEntity {
                user_id,
                platform: platform.to_string(),
                account_id: identity.account_id,
                handle: identity.handle,
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                token_type: token.token_type.unwrap_or_else(|| "bearer".to_string()),
                expires_at,
                is_active: true,
                is_verified,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            %user_id,
            %platform,
            handle = %account.handle,
            is_verified = account.is_verified,
            "oauth_connect: account linked"
        );
        Ok(account)
    }
}

fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::oauth_sessions::MockOAuthSessionStore;
    use crate::interfaces::platform::MockPlatformAdapter;
    use domain::repositories::linked_accounts::MockLinkedAccountRepository;
    use domain::value_objects::platform_api::{
        AuthorizationRequest, PlatformIdentity, TokenResult,
    };
    use mockall::predicate::eq;

    fn registry_with(adapter: MockPlatformAdapter) -> Arc<AdapterRegistry> {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        Arc::new(registry)
    }

    fn linked_account(user_id: Uuid) -> LinkedAccountEntity {
        let now = Utc::now();
        LinkedAccountEntity {
            id: Uuid::new_v4(),
            user_id,
            platform: "twitter".to_string(),
            account_id: "12345".to_string(),
            handle: "tester".to_string(),
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

    #[test]
    fn state_tokens_are_unique_and_long_enough() {
        let a = generate_state_token();
        let b = generate_state_token();
        assert_ne!(a, b);
        // 32 bytes base64url-encoded without padding.
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn begin_stores_state_and_verifier_and_returns_redirect() {
        let user_id = Uuid::new_v4();

        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_platform().return_const(Platform::Twitter);
        adapter
            .expect_build_authorization_request()
            .returning(|state| AuthorizationRequest {
                redirect_url: format!("https://provider.example/authorize?state={state}"),
                code_verifier: Some("verifier".to_string()),
            });

        let mut sessions = MockOAuthSessionStore::new();
        sessions
            .expect_put()
            .withf(move |uid, platform, pending| {
                *uid == user_id
                    && *platform == Platform::Twitter
                    && pending.code_verifier.as_deref() == Some("verifier")
                    && !pending.state.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let accounts = MockLinkedAccountRepository::new();
        let usecase = OAuthConnectUseCase::new(
            registry_with(adapter),
            Arc::new(accounts),
            Arc::new(sessions),
        );

        let redirect = usecase.begin(user_id, Platform::Twitter).await.unwrap();
        assert!(redirect.starts_with("https://provider.example/authorize?state="));
    }

    #[tokio::test]
    async fn mismatched_state_fails_without_token_exchange() {
        let user_id = Uuid::new_v4();

        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_platform().return_const(Platform::Twitter);
        adapter.expect_exchange_code_for_token().times(0);

        let mut sessions = MockOAuthSessionStore::new();
        sessions.expect_take().times(1).returning(|_, _| {
            Ok(Some(PendingAuthorization {
                state: "expected-state".to_string(),
                code_verifier: None,
                created_at: Utc::now(),
            }))
        });

        let usecase = OAuthConnectUseCase::new(
            registry_with(adapter),
            Arc::new(MockLinkedAccountRepository::new()),
            Arc::new(sessions),
        );

        let result = usecase
            .complete(user_id, Platform::Twitter, Some("code"), Some("forged"))
            .await;
        assert!(matches!(result, Err(ConnectError::StateMismatch)));
    }

    #[tokio::test]
    async fn replayed_callback_finds_no_pending_entry_and_fails() {
        let user_id = Uuid::new_v4();

        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_platform().return_const(Platform::Twitter);
        adapter.expect_exchange_code_for_token().times(0);

        // First consumption already removed the entry.
        let mut sessions = MockOAuthSessionStore::new();
        sessions.expect_take().times(1).returning(|_, _| Ok(None));

        let usecase = OAuthConnectUseCase::new(
            registry_with(adapter),
            Arc::new(MockLinkedAccountRepository::new()),
            Arc::new(sessions),
        );

        let result = usecase
            .complete(user_id, Platform::Twitter, Some("code"), Some("state"))
            .await;
        assert!(matches!(result, Err(ConnectError::StateMismatch)));
    }

    #[tokio::test]
    async fn successful_callback_links_account_with_expiry() {
        let user_id = Uuid::new_v4();

        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_platform().return_const(Platform::Twitter);
        adapter
            .expect_exchange_code_for_token()
            .withf(|code, verifier| code == "auth-code" && verifier == &Some("verifier"))
            .times(1)
            .returning(|_, _| {
                Ok(TokenResult {
                    access_token: "fresh-token".to_string(),
                    refresh_token: Some("refresh".to_string()),
                    token_type: Some("bearer".to_string()),
                    expires_in: Some(7200),
                })
            });
        adapter
            .expect_fetch_identity()
            .with(eq("fresh-token"))
            .times(1)
            .returning(|_| {
                Ok(PlatformIdentity {
                    account_id: "12345".to_string(),
                    handle: "tester".to_string(),
                    display_name: Some("Tester".to_string()),
                })
            });

        let mut sessions = MockOAuthSessionStore::new();
        sessions.expect_take().times(1).returning(|_, _| {
            Ok(Some(PendingAuthorization {
                state: "good-state".to_string(),
                code_verifier: Some("verifier".to_string()),
                created_at: Utc::now(),
            }))
        });

        let mut accounts = MockLinkedAccountRepository::new();
        accounts
            .expect_upsert_from_oauth()
            .withf(move |entity| {
                entity.user_id == user_id
                    && entity.platform == "twitter"
                    && entity.handle == "tester"
                    && entity.access_token == "fresh-token"
                    && entity.expires_at.is_some()
            })
            .times(1)
            .returning(move |_| Ok(linked_account(user_id)));

        let usecase = OAuthConnectUseCase::new(
            registry_with(adapter),
            Arc::new(accounts),
            Arc::new(sessions),
        );

        let account = usecase
            .complete(user_id, Platform::Twitter, Some("auth-code"), Some("good-state"))
            .await
            .unwrap();
        assert_eq!(account.handle, "tester");
    }

    #[tokio::test]
    async fn missing_provider_lifetime_leaves_expiry_unset() {
        let user_id = Uuid::new_v4();

        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_platform().return_const(Platform::Reddit);
        adapter
            .expect_exchange_code_for_token()
            .returning(|_, _| {
                Ok(TokenResult {
                    access_token: "token".to_string(),
                    refresh_token: None,
                    token_type: None,
                    expires_in: None,
                })
            });
        adapter.expect_fetch_identity().returning(|_| {
            Ok(PlatformIdentity {
                account_id: "abc".to_string(),
                handle: "tester".to_string(),
                display_name: None,
            })
        });

        let mut sessions = MockOAuthSessionStore::new();
        sessions.expect_take().returning(|_, _| {
            Ok(Some(PendingAuthorization {
                state: "s".to_string(),
                code_verifier: None,
                created_at: Utc::now(),
            }))
        });

        let mut accounts = MockLinkedAccountRepository::new();
        accounts
            .expect_upsert_from_oauth()
            .withf(|entity| entity.expires_at.is_none() && entity.token_type == "bearer")
            .times(1)
            .returning(move |_| Ok(linked_account(user_id)));

        let usecase = OAuthConnectUseCase::new(
            registry_with(adapter),
            Arc::new(accounts),
            Arc::new(sessions),
        );

        usecase
            .complete(user_id, Platform::Reddit, Some("code"), Some("s"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn identity_failure_still_links_account_and_keeps_token() {
        let user_id = Uuid::new_v4();

        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_platform().return_const(Platform::Twitter);
        adapter.expect_exchange_code_for_token().returning(|_, _| {
            Ok(TokenResult {
                access_token: "valid-but-unresolved".to_string(),
                refresh_token: None,
                token_type: None,
                expires_in: None,
            })
        });
        adapter.expect_fetch_identity().returning(|_| {
            Err(domain::value_objects::platform_api::AdapterError::Provider {
                status: 503,
                detail: "unavailable".to_string(),
            })
        });

        let mut sessions = MockOAuthSessionStore::new();
        sessions.expect_take().returning(|_, _| {
            Ok(Some(PendingAuthorization {
                state: "s".to_string(),
                code_verifier: None,
                created_at: Utc::now(),
            }))
        });

        // The exchanged token is valid, so the account is persisted anyway,
        // unverified and with an empty identity.
        let mut accounts = MockLinkedAccountRepository::new();
        accounts
            .expect_upsert_from_oauth()
            .withf(move |entity| {
                entity.user_id == user_id
                    && entity.access_token == "valid-but-unresolved"
                    && entity.handle.is_empty()
                    && entity.account_id.is_empty()
                    && !entity.is_verified
                    && entity.is_active
            })
            .times(1)
            .returning(move |entity| {
                let mut account = linked_account(user_id);
                account.handle = entity.handle;
                account.account_id = entity.account_id;
                account.is_verified = false;
                Ok(account)
            });

        let usecase = OAuthConnectUseCase::new(
            registry_with(adapter),
            Arc::new(accounts),
            Arc::new(sessions),
        );

        let account = usecase
            .complete(user_id, Platform::Twitter, Some("code"), Some("s"))
            .await
            .unwrap();
        assert!(!account.is_verified);
    }
}
