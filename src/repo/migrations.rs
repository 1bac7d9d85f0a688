use sqlx::{Executor, PgPool};
use tracing::info;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    tx.execute(
        r#"
        CREATE SCHEMA IF NOT EXISTS quiz;
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS quiz.users (
          id                 UUID PRIMARY KEY DEFAULT gen_random_uuid(),
          email              TEXT NOT NULL UNIQUE,
          created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          streak_count       INTEGER NOT NULL DEFAULT 0,
          last_active_date   DATE,
          total_score        INTEGER NOT NULL DEFAULT 0,
          last_completed_at  TIMESTAMPTZ
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS quiz.question_sets (
          id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
          date        DATE NOT NULL UNIQUE,
          created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS quiz.questions (
          id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
          set_id          UUID NOT NULL REFERENCES quiz.question_sets(id) ON DELETE CASCADE,
          content         TEXT NOT NULL,
          options         JSONB NOT NULL,
          correct_option  TEXT NOT NULL,
          explanation     TEXT NOT NULL,
          category        TEXT NOT NULL,
          created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_questions_set_id ON quiz.questions(set_id);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS quiz.user_responses (
          id               UUID PRIMARY KEY DEFAULT gen_random_uuid(),
          user_id          UUID NOT NULL REFERENCES quiz.users(id) ON DELETE CASCADE,
          question_id      UUID NOT NULL REFERENCES quiz.questions(id) ON DELETE CASCADE,
          selected_option  TEXT NOT NULL,
          is_correct       BOOLEAN NOT NULL,
          answered_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          UNIQUE (user_id, question_id)
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_user_responses_user_id ON quiz.user_responses(user_id);
        "#,
    )
    .await?;

    tx.commit().await?;
    info!("database schema ensured");
    Ok(())
}
