use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub streak_count: i32,
    pub last_active_date: Option<NaiveDate>,
    pub total_score: i32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

pub async fn get_or_create(pool: &PgPool, email: &str) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO quiz.users (email)
        VALUES ($1)
        ON CONFLICT (email) DO UPDATE
        SET email = EXCLUDED.email
        RETURNING id, email, created_at, streak_count, last_active_date,
                  total_score, last_completed_at
        "#,
    )
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email, created_at, streak_count, last_active_date,
               total_score, last_completed_at
        FROM quiz.users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn add_score(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE quiz.users
        SET total_score = total_score + $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(delta)
    .execute(executor)
    .await
    .map(|_| ())
}

pub async fn update_streak(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    streak_count: i32,
    completed_at: DateTime<Utc>,
    active_date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE quiz.users
        SET streak_count = $2,
            last_completed_at = $3,
            last_active_date = $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(streak_count)
    .bind(completed_at)
    .bind(active_date)
    .execute(executor)
    .await
    .map(|_| ())
}
