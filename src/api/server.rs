use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::resolvers::{BlogSchema, build_schema};
use crate::config::Config;
use crate::credentials::TokenIssuer;
use crate::db::repo;

pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenIssuer,
    pub fullname_required: bool,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            tokens: TokenIssuer::from_config(config),
            fullname_required: config.fullname_required,
        }
    }
}

async fn graphql_handler(State(schema): State<BlogSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

pub fn router(state: Arc<AppState>) -> Router {
    let schema = build_schema(state);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(schema)
}

pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let pool = repo::connect(&config.database_url, config.database_max_connections).await?;
    repo::create_tables(&pool).await?;

    let state = Arc::new(AppState::new(pool, config));
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}/graphql", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
