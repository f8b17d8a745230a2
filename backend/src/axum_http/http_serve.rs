use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use application::interfaces::platform::AdapterRegistry;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use infra::postgres::postgres_connection::PgPoolSquad;
use infra::sessions::InMemoryOAuthSessionStore;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    registry: Arc<AdapterRegistry>,
) -> Result<()> {
    // Shared across begin and callback; both halves of a handshake must see
    // the same pending entry.
    let oauth_sessions = Arc::new(InMemoryOAuthSessionStore::new());

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/oauth",
            routers::oauth::routes(
                Arc::clone(&db_pool),
                Arc::clone(&registry),
                Arc::clone(&oauth_sessions),
            ),
        )
        .nest(
            "/api/v1/posts",
            routers::posts::routes(Arc::clone(&db_pool), Arc::clone(&registry)),
        )
        .nest(
            "/api/v1/analytics",
            routers::analytics::routes(Arc::clone(&db_pool), Arc::clone(&registry)),
        )
        .nest(
            "/api/v1/accounts",
            routers::accounts::routes(Arc::clone(&db_pool)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
