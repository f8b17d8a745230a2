use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::AppError;
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::value_objects::enums::platforms::Platform;
use infra::postgres::{
    postgres_connection::PgPoolSquad, repositories::linked_accounts::LinkedAccountPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let linked_account_repository = LinkedAccountPostgres::new(Arc::clone(&db_pool));

    Router::new()
        .route("/:platform/disconnect", post(disconnect))
        .with_state(Arc::new(linked_account_repository))
}

#[derive(Debug, Default, Deserialize)]
pub struct DisconnectRequest {
    /// Omitted: every account of the platform is disconnected.
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    /// 0 means there was nothing to disconnect.
    pub deactivated: usize,
}

pub async fn disconnect<T>(
    State(linked_account_repository): State<Arc<T>>,
    auth: AuthUser,
    Path(platform): Path<String>,
    request: Option<Json<DisconnectRequest>>,
) -> Result<impl IntoResponse, AppError>
where
    T: LinkedAccountRepository + Send + Sync,
{
    let platform = Platform::from_str(&platform)
        .map_err(|_| AppError::BadRequest(format!("Unknown platform: {platform}")))?;
    let account_id = request.and_then(|Json(body)| body.account_id);

    let deactivated = linked_account_repository
        .deactivate(auth.user_id, platform, account_id)
        .await?;

    info!(
        user_id = %auth.user_id,
        %platform,
        deactivated,
        "accounts: disconnect processed"
    );

    Ok(Json(DisconnectResponse { deactivated }))
}
