use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    model::{CompletedDatesOut, EarliestDateOut, UserStatsOut},
    repo,
    util::date,
};

pub async fn user_stats(pool: &PgPool, user_id: Uuid) -> AppResult<UserStatsOut> {
    let user = repo::users::get_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let totals = repo::responses::totals_for_user(pool, user_id).await?;
    let accuracy = if totals.total > 0 {
        round_to(totals.correct as f64 / totals.total as f64 * 100.0, 2)
    } else {
        0.0
    };

    let set_scores =
        repo::responses::set_scores_excluding_date(pool, user_id, date::today_ist()).await?;
    let (historical_average_score, historical_attempts) = historical_average(
        set_scores
            .iter()
            .filter(|row| row.set_size > 0 && row.answered == row.set_size)
            .map(|row| row.correct),
    );

    Ok(UserStatsOut {
        streak_count: user.streak_count,
        total_questions: totals.total,
        correct_answers: totals.correct,
        accuracy,
        last_active_date: user.last_active_date,
        historical_average_score,
        historical_attempts,
    })
}

pub async fn completed_dates(pool: &PgPool, user_id: Uuid) -> AppResult<CompletedDatesOut> {
    repo::users::get_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let dates = repo::responses::completed_dates(pool, user_id).await?;
    Ok(CompletedDatesOut { dates })
}

pub async fn earliest_set_date(pool: &PgPool) -> AppResult<EarliestDateOut> {
    let date: Option<NaiveDate> = repo::question_sets::earliest_date(pool).await?;
    Ok(EarliestDateOut { date })
}

/// Average score across fully completed past sets, rounded to one decimal.
fn historical_average(scores: impl Iterator<Item = i64>) -> (f64, i64) {
    let scores: Vec<i64> = scores.collect();
    if scores.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = scores.iter().sum();
    let average = round_to(sum as f64 / scores.len() as f64, 1);
    (average, scores.len() as i64)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_average_rounds_to_one_decimal() {
        let (average, attempts) = historical_average([7, 8, 8].into_iter());
        assert_eq!(average, 7.7);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn historical_average_of_nothing_is_zero() {
        let (average, attempts) = historical_average(std::iter::empty());
        assert_eq!(average, 0.0);
        assert_eq!(attempts, 0);
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(round_to(2.0 / 3.0 * 100.0, 2), 66.67);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
