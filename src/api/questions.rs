use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;

use crate::{
    app::AppState,
    error::{AppError, AppResult},
    model::{EarliestDateOut, QuestionSetOut, QuestionSetQuery, SubmitPayload, SubmitResult},
    service,
};

pub async fn today(
    State(state): State<AppState>,
    Query(query): Query<QuestionSetQuery>,
) -> AppResult<Json<QuestionSetOut>> {
    let set = service::questions::get_today_set(&state.pool, query.user_id).await?;
    Ok(Json(set))
}

pub async fn by_date(
    State(state): State<AppState>,
    Path(raw_date): Path<String>,
    Query(query): Query<QuestionSetQuery>,
) -> AppResult<Json<QuestionSetOut>> {
    let set_date = raw_date
        .parse::<NaiveDate>()
        .map_err(|_| AppError::BadRequest(format!("invalid date {raw_date:?}")))?;
    let set = service::questions::get_set(&state.pool, set_date, query.user_id).await?;
    Ok(Json(set))
}

pub async fn earliest_date(
    State(state): State<AppState>,
) -> AppResult<Json<EarliestDateOut>> {
    let earliest = service::stats::earliest_set_date(&state.pool).await?;
    Ok(Json(earliest))
}

pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitPayload>,
) -> AppResult<Json<SubmitResult>> {
    let result = service::questions::submit(&state.pool, payload).await?;
    Ok(Json(result))
}
