use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct ResponseRow {
    pub question_id: Uuid,
    pub selected_option: String,
    pub is_correct: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ResponseTotals {
    pub total: i64,
    pub correct: i64,
}

/// Per-set completion summary used for the historical average.
#[derive(Debug, sqlx::FromRow)]
pub struct SetScoreRow {
    pub answered: i64,
    pub correct: i64,
    pub set_size: i64,
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    question_ids: &[Uuid],
) -> Result<Vec<ResponseRow>, sqlx::Error> {
    if question_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ResponseRow>(
        r#"
        SELECT question_id, selected_option, is_correct
        FROM quiz.user_responses
        WHERE user_id = $1
          AND question_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(question_ids)
    .fetch_all(pool)
    .await
}

pub async fn upsert(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    question_id: Uuid,
    selected_option: &str,
    is_correct: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO quiz.user_responses (user_id, question_id, selected_option, is_correct)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, question_id) DO UPDATE
        SET selected_option = EXCLUDED.selected_option,
            is_correct = EXCLUDED.is_correct,
            answered_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .bind(selected_option)
    .bind(is_correct)
    .execute(executor)
    .await
    .map(|_| ())
}

pub async fn totals_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<ResponseTotals, sqlx::Error> {
    sqlx::query_as::<_, ResponseTotals>(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE is_correct) AS correct
        FROM quiz.user_responses
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn completed_dates(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT DISTINCT s.date
        FROM quiz.user_responses r
        JOIN quiz.questions q ON q.id = r.question_id
        JOIN quiz.question_sets s ON s.id = q.set_id
        WHERE r.user_id = $1
        ORDER BY s.date
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// One row per set the user has touched before `exclude_date`, with how many
/// of its questions were answered and answered correctly.
pub async fn set_scores_excluding_date(
    pool: &PgPool,
    user_id: Uuid,
    exclude_date: NaiveDate,
) -> Result<Vec<SetScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, SetScoreRow>(
        r#"
        SELECT COUNT(*) AS answered,
               COUNT(*) FILTER (WHERE r.is_correct) AS correct,
               (SELECT COUNT(*) FROM quiz.questions q2 WHERE q2.set_id = s.id) AS set_size
        FROM quiz.user_responses r
        JOIN quiz.questions q ON q.id = r.question_id
        JOIN quiz.question_sets s ON s.id = q.set_id
        WHERE r.user_id = $1
          AND s.date <> $2
        GROUP BY s.id
        "#,
    )
    .bind(user_id)
    .bind(exclude_date)
    .fetch_all(pool)
    .await
}
