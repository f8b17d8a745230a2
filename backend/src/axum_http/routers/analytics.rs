use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::AppError;
use application::interfaces::platform::AdapterRegistry;
use application::usecases::analytics::AnalyticsUseCase;
use domain::repositories::analytics::AnalyticsRepository;
use domain::repositories::linked_accounts::LinkedAccountRepository;
use domain::repositories::posts::PostRepository;
use domain::value_objects::analytics::{AccountAnalyticsView, ActivityItem, PostAnalyticsView};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        analytics::AnalyticsPostgres, linked_accounts::LinkedAccountPostgres, posts::PostPostgres,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, registry: Arc<AdapterRegistry>) -> Router {
    let linked_account_repository = LinkedAccountPostgres::new(Arc::clone(&db_pool));
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let analytics_repository = AnalyticsPostgres::new(Arc::clone(&db_pool));
    let analytics_usecase = AnalyticsUseCase::new(
        registry,
        Arc::new(linked_account_repository),
        Arc::new(post_repository),
        Arc::new(analytics_repository),
    );

    Router::new()
        .route("/", get(overview))
        .with_state(Arc::new(analytics_usecase))
}

#[derive(Debug, Serialize)]
pub struct AnalyticsOverviewResponse {
    pub posts: Vec<PostAnalyticsView>,
    pub accounts: Vec<AccountAnalyticsView>,
    pub recent: Vec<ActivityItem>,
    pub top: Vec<ActivityItem>,
}

/// One round trip for the whole dashboard: per-post metrics, per-account
/// metrics, and both rankings.
pub async fn overview<L, P, R>(
    State(analytics_usecase): State<Arc<AnalyticsUseCase<L, P, R>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    L: LinkedAccountRepository + Send + Sync,
    P: PostRepository + Send + Sync,
    R: AnalyticsRepository + Send + Sync,
{
    let posts = analytics_usecase.post_analytics(auth.user_id).await?;
    let accounts = analytics_usecase.account_analytics(auth.user_id).await?;
    let rankings = analytics_usecase.dashboard(auth.user_id).await?;

    Ok(Json(AnalyticsOverviewResponse {
        posts,
        accounts,
        recent: rankings.recent,
        top: rankings.top,
    }))
}
