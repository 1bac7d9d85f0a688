use chrono::NaiveDate;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::model::{GeneratedQuestion, QuestionOptions};

#[derive(Debug, sqlx::FromRow)]
pub struct QuestionSetRow {
    pub id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub set_id: Uuid,
    pub content: String,
    pub options: Json<QuestionOptions>,
    pub correct_option: String,
    pub explanation: String,
    pub category: String,
}

pub async fn get_by_date(
    pool: &PgPool,
    date: NaiveDate,
) -> Result<Option<QuestionSetRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionSetRow>(
        r#"
        SELECT id, date
        FROM quiz.question_sets
        WHERE date = $1
        "#,
    )
    .bind(date)
    .fetch_optional(pool)
    .await
}

pub async fn earliest_date(pool: &PgPool) -> Result<Option<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date
        FROM quiz.question_sets
        ORDER BY date
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

pub async fn list_questions(
    pool: &PgPool,
    set_id: Uuid,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, set_id, content, options, correct_option, explanation, category
        FROM quiz.questions
        WHERE set_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(set_id)
    .fetch_all(pool)
    .await
}

pub async fn questions_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, set_id, content, options, correct_option, explanation, category
        FROM quiz.questions
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Question texts published on or after `since`, the dedup corpus for the
/// next generation run.
pub async fn recent_contents(
    pool: &PgPool,
    since: NaiveDate,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT q.content
        FROM quiz.questions q
        JOIN quiz.question_sets s ON s.id = q.set_id
        WHERE s.date >= $1
        ORDER BY s.date DESC, q.created_at
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Removes the set for `date` if present; questions and responses go with it
/// through the cascades. Returns whether a set was deleted.
pub async fn delete_by_date(pool: &PgPool, date: NaiveDate) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM quiz.question_sets
        WHERE date = $1
        "#,
    )
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert the day's set and all of its questions in one transaction.
pub async fn insert_set_with_questions(
    pool: &PgPool,
    date: NaiveDate,
    questions: &[GeneratedQuestion],
) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let set_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO quiz.question_sets (date)
        VALUES ($1)
        RETURNING id
        "#,
    )
    .bind(date)
    .fetch_one(&mut *tx)
    .await?;

    for question in questions {
        sqlx::query(
            r#"
            INSERT INTO quiz.questions (
                set_id,
                content,
                options,
                correct_option,
                explanation,
                category
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(set_id)
        .bind(&question.content)
        .bind(Json(&question.options))
        .bind(question.correct_option.as_str())
        .bind(&question.explanation)
        .bind(&question.category)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(set_id)
}
