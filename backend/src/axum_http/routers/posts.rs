use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::AppError;
use application::interfaces::platform::AdapterRegistry;
use application::usecases::publish::PublishFanOutUseCase;
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::repositories::posts::PostRepository;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::publish::{ComposePostModel, PostWithShares};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{linked_accounts::LinkedAccountPostgres, posts::PostPostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, registry: Arc<AdapterRegistry>) -> Router {
    let linked_account_repository = LinkedAccountPostgres::new(Arc::clone(&db_pool));
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let publish_usecase = PublishFanOutUseCase::new(
        registry,
        Arc::new(linked_account_repository),
        Arc::new(post_repository),
    );

    Router::new()
        .route("/", post(publish))
        .route("/history", get(history))
        .with_state(Arc::new(publish_usecase))
}

#[derive(Debug, Deserialize)]
pub struct ComposePostRequest {
    pub content: String,
    pub platforms: Vec<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub id: Uuid,
    pub linked_account_id: Uuid,
    pub platform_post_id: Option<String>,
    pub platform_url: Option<String>,
    pub is_successful: bool,
    pub error: Option<String>,
    pub shared_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PostHistoryResponse {
    pub id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub shares: Vec<ShareResponse>,
}

impl From<PostWithShares> for PostHistoryResponse {
    fn from(entry: PostWithShares) -> Self {
        Self {
            id: entry.post.id,
            content: entry.post.content,
            media_url: entry.post.media_url,
            created_at: entry.post.created_at,
            shares: entry
                .shares
                .into_iter()
                .map(|share| ShareResponse {
                    id: share.id,
                    linked_account_id: share.linked_account_id,
                    platform_post_id: share.platform_post_id,
                    platform_url: share.platform_url,
                    is_successful: share.is_successful,
                    error: share.error,
                    shared_at: share.shared_at,
                })
                .collect(),
        }
    }
}

pub async fn publish<A, P>(
    State(publish_usecase): State<Arc<PublishFanOutUseCase<A, P>>>,
    auth: AuthUser,
    Json(request): Json<ComposePostRequest>,
) -> Result<impl IntoResponse, AppError>
where
    A: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
{
    let mut platforms = Vec::with_capacity(request.platforms.len());
    for raw in &request.platforms {
        let platform = Platform::from_str(raw)
            .map_err(|_| AppError::BadRequest(format!("Unknown platform: {raw}")))?;
        platforms.push(platform);
    }

    let report = publish_usecase
        .publish(
            auth.user_id,
            ComposePostModel {
                content: request.content,
                media_url: request.media_url,
                platforms,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn history<A, P>(
    State(publish_usecase): State<Arc<PublishFanOutUseCase<A, P>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    A: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
{
    let posts = publish_usecase.history(auth.user_id).await?;
    let response: Vec<PostHistoryResponse> =
        posts.into_iter().map(PostHistoryResponse::from).collect();

    Ok(Json(response))
}
