use std::{sync::Arc, time::Duration};

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    api, auth,
    config::{AppConfig, GeneratorConfig},
    generator, middleware, repo,
    util::gemini::GeminiClient,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cron_secret: Option<String>,
    pub generator_config: GeneratorConfig,
    pub gemini: Option<Arc<GeminiClient>>,
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.db.url)
        .await?;

    repo::migrations::ensure_schema(&pool).await?;

    let gemini = config
        .gemini
        .api_key
        .as_ref()
        .filter(|key| !key.trim().is_empty())
        .map(|_| GeminiClient::new(config.gemini.clone()))
        .transpose()?
        .map(Arc::new);

    generator::spawn(pool.clone(), config.generator.clone(), gemini.clone())?;

    let state = AppState {
        pool,
        cron_secret: config.cron.secret.clone(),
        generator_config: config.generator.clone(),
        gemini,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let layers = ServiceBuilder::new()
        .layer(axum_middleware::from_fn(middleware::assign_trace_id))
        .layer(cors);

    let cron_api = Router::new()
        .route("/generate", post(api::generate::generate_today))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_cron_secret,
        ))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/users", post(api::users::create))
        .route("/users/:id/stats", get(api::users::stats))
        .route("/users/:id/completed-dates", get(api::users::completed_dates))
        .route("/questions/today", get(api::questions::today))
        .route("/questions/earliest-date", get(api::questions::earliest_date))
        .route("/questions/submit", post(api::questions::submit))
        .route("/questions/:date", get(api::questions::by_date))
        .nest("/cron", cron_api)
        .layer(layers)
        .with_state(state);

    Ok(router)
}
