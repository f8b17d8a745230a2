use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::AppError;
use application::interfaces::oauth_sessions::OAuthSessionStore;
use application::interfaces::platform::AdapterRegistry;
use application::usecases::oauth_connector::OAuthConnectUseCase;
use domain::entities::linked_accounts::LinkedAccountEntity;
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::value_objects::enums::platforms::Platform;
use infra::postgres::{
    postgres_connection::PgPoolSquad, repositories::linked_accounts::LinkedAccountPostgres,
};
use infra::sessions::InMemoryOAuthSessionStore;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    registry: Arc<AdapterRegistry>,
    oauth_sessions: Arc<InMemoryOAuthSessionStore>,
) -> Router {
    let linked_account_repository = LinkedAccountPostgres::new(Arc::clone(&db_pool));
    let oauth_connect_usecase = OAuthConnectUseCase::new(
        registry,
        Arc::new(linked_account_repository),
        oauth_sessions,
    );

    Router::new()
        .route("/:platform/connect", get(connect))
        .route("/:platform/callback", get(callback).post(callback))
        .with_state(Arc::new(oauth_connect_usecase))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Token material never leaves the server; callers get the identity only.
#[derive(Debug, Serialize)]
pub struct ConnectedAccountResponse {
    pub id: Uuid,
    pub platform: String,
    pub account_id: String,
    pub handle: String,
    pub is_verified: bool,
}

impl From<LinkedAccountEntity> for ConnectedAccountResponse {
    fn from(account: LinkedAccountEntity) -> Self {
        Self {
            id: account.id,
            platform: account.platform,
            account_id: account.account_id,
            handle: account.handle,
            is_verified: account.is_verified,
        }
    }
}

fn parse_platform(raw: &str) -> Result<Platform, AppError> {
    Platform::from_str(raw).map_err(|_| AppError::BadRequest(format!("Unknown platform: {raw}")))
}

pub async fn connect<A, S>(
    State(oauth_connect_usecase): State<Arc<OAuthConnectUseCase<A, S>>>,
    auth: AuthUser,
    Path(platform): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    A: LinkedAccountRepository + Send + Sync,
    S: OAuthSessionStore + Send + Sync,
{
    let platform = parse_platform(&platform)?;
    let redirect_url = oauth_connect_usecase.begin(auth.user_id, platform).await?;

    Ok(Redirect::temporary(&redirect_url))
}

pub async fn callback<A, S>(
    State(oauth_connect_usecase): State<Arc<OAuthConnectUseCase<A, S>>>,
    auth: AuthUser,
    Path(platform): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, AppError>
where
    A: LinkedAccountRepository + Send + Sync,
    S: OAuthSessionStore + Send + Sync,
{
    let platform = parse_platform(&platform)?;

    let account = oauth_connect_usecase
        .complete(
            auth.user_id,
            platform,
            params.code.as_deref(),
            params.state.as_deref(),
        )
        .await?;

    Ok(Json(ConnectedAccountResponse::from(account)))
}
