use anyhow::anyhow;
use axum::{extract::State, Json};

use crate::{
    app::AppState,
    error::{AppError, AppResult},
    generator,
    model::GenerateResult,
    util::date,
};

/// Force-regenerate today's question set. Guarded by the cron secret; the
/// scheduled cron hits this as well as operators re-rolling a bad batch.
pub async fn generate_today(State(state): State<AppState>) -> AppResult<Json<GenerateResult>> {
    let gemini = state
        .gemini
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow!("gemini api key not configured")))?;

    let result = generator::run_generation(
        &state.pool,
        gemini,
        &state.generator_config,
        date::today_ist(),
        true,
    )
    .await
    .map_err(AppError::Internal)?;

    Ok(Json(result))
}
