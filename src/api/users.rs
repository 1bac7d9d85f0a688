use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{AppError, AppResult},
    model::{CompletedDatesOut, CreateUserPayload, UserOut, UserStatsOut},
    repo, service,
};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> AppResult<Json<UserOut>> {
    let email = payload.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("invalid email".to_string()));
    }

    let user = repo::users::get_or_create(&state.pool, &email).await?;
    Ok(Json(UserOut {
        id: user.id,
        email: user.email,
        streak_count: user.streak_count,
        total_score: user.total_score,
        last_active_date: user.last_active_date,
        created_at: user.created_at,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserStatsOut>> {
    let stats = service::stats::user_stats(&state.pool, user_id).await?;
    Ok(Json(stats))
}

pub async fn completed_dates(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<CompletedDatesOut>> {
    let dates = service::stats::completed_dates(&state.pool, user_id).await?;
    Ok(Json(dates))
}
