use std::collections::HashMap;

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    model::{
        QuestionOption, QuestionOut, QuestionSetOut, SubmitAnswer, SubmitPayload, SubmitResult,
        UserResponseOut,
    },
    repo::{self, responses::ResponseRow},
    util::{date, streak},
};

/// The question set for a date, with the caller's prior responses merged in
/// when a user id is supplied.
pub async fn get_set(
    pool: &PgPool,
    set_date: NaiveDate,
    user_id: Option<Uuid>,
) -> AppResult<QuestionSetOut> {
    let set = repo::question_sets::get_by_date(pool, set_date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no question set for {set_date}")))?;

    let rows = repo::question_sets::list_questions(pool, set.id).await?;

    let mut response_map = HashMap::new();
    if let Some(user_id) = user_id {
        let question_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let responses = repo::responses::list_for_user(pool, user_id, &question_ids).await?;
        for response in responses {
            let selected = parse_stored_option(&response.selected_option)?;
            response_map.insert(
                response.question_id,
                UserResponseOut {
                    selected_option: selected,
                    is_correct: response.is_correct,
                },
            );
        }
    }

    let mut questions = Vec::with_capacity(rows.len());
    for row in rows {
        let user_response = response_map.remove(&row.id);
        questions.push(QuestionOut {
            id: row.id,
            content: row.content,
            options: row.options.0,
            correct_option: parse_stored_option(&row.correct_option)?,
            explanation: row.explanation,
            category: row.category,
            user_response,
        });
    }

    Ok(QuestionSetOut {
        set_id: set.id,
        date: set.date,
        questions,
    })
}

pub async fn get_today_set(pool: &PgPool, user_id: Option<Uuid>) -> AppResult<QuestionSetOut> {
    get_set(pool, date::today_ist(), user_id).await
}

/// Grade a submission against the stored correct options and record it.
///
/// Once every question of a set has a response the score is locked: repeat
/// submissions return the original score and change nothing. The lifetime
/// score only grows by answers that were not already correct, and the streak
/// moves only when the full set is completed for the first time. All writes
/// for one submission land in a single transaction.
pub async fn submit(pool: &PgPool, payload: SubmitPayload) -> AppResult<SubmitResult> {
    if payload.answers.is_empty() {
        return Err(AppError::BadRequest("answers must not be empty".to_string()));
    }

    let user = repo::users::get_by_id(pool, payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let submitted_ids: Vec<Uuid> = payload.answers.iter().map(|a| a.question_id).collect();
    let question_rows = repo::question_sets::questions_by_ids(pool, &submitted_ids).await?;
    if question_rows.len() != submitted_ids.len() {
        return Err(AppError::BadRequest(
            "unknown or duplicate question id in answers".to_string(),
        ));
    }

    let set_id = question_rows[0].set_id;
    if question_rows.iter().any(|row| row.set_id != set_id) {
        return Err(AppError::BadRequest(
            "answers span more than one question set".to_string(),
        ));
    }

    let set_questions = repo::question_sets::list_questions(pool, set_id).await?;
    let set_size = set_questions.len() as i64;
    let set_question_ids: Vec<Uuid> = set_questions.iter().map(|row| row.id).collect();

    let existing =
        repo::responses::list_for_user(pool, payload.user_id, &set_question_ids).await?;

    let correct_by_question: HashMap<Uuid, QuestionOption> = question_rows
        .iter()
        .map(|row| Ok((row.id, parse_stored_option(&row.correct_option)?)))
        .collect::<AppResult<_>>()?;

    let graded = match grade_submission(&payload.answers, &correct_by_question, &existing, set_size)?
    {
        GradeOutcome::Locked { score } => {
            return Ok(SubmitResult {
                score,
                total_questions: set_size,
                streak_count: user.streak_count,
                score_locked: true,
            });
        }
        GradeOutcome::Graded {
            responses,
            score,
            newly_correct,
        } => (responses, score, newly_correct),
    };
    let (responses, score, newly_correct) = graded;

    let completed_full_set = payload.answers.len() as i64 == set_size;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    for answer in &responses {
        repo::responses::upsert(
            &mut *tx,
            payload.user_id,
            answer.question_id,
            answer.selected_option.as_str(),
            answer.is_correct,
        )
        .await?;
    }

    if newly_correct > 0 {
        repo::users::add_score(&mut *tx, payload.user_id, newly_correct).await?;
    }

    let streak_count = if completed_full_set {
        let next = streak::next_streak(user.streak_count, user.last_completed_at, now);
        repo::users::update_streak(&mut *tx, payload.user_id, next, now, date::ist_date(now))
            .await?;
        next
    } else {
        user.streak_count
    };

    tx.commit().await?;

    tracing::info!(
        user_id = %payload.user_id,
        set_id = %set_id,
        score,
        total = set_size,
        "submission graded"
    );

    Ok(SubmitResult {
        score,
        total_questions: set_size,
        streak_count,
        score_locked: false,
    })
}

#[derive(Debug)]
enum GradeOutcome {
    /// Every question of the set already has a response; nothing may change.
    Locked { score: i64 },
    Graded {
        responses: Vec<GradedAnswer>,
        score: i64,
        newly_correct: i32,
    },
}

#[derive(Debug)]
struct GradedAnswer {
    question_id: Uuid,
    selected_option: QuestionOption,
    is_correct: bool,
}

/// Pure grading decision: lock when the set is already fully answered,
/// otherwise mark each answer and count how many correct answers are new
/// (previously wrong or unanswered questions only).
fn grade_submission(
    answers: &[SubmitAnswer],
    correct_by_question: &HashMap<Uuid, QuestionOption>,
    existing: &[ResponseRow],
    set_size: i64,
) -> AppResult<GradeOutcome> {
    if existing.len() as i64 == set_size {
        let score = existing.iter().filter(|r| r.is_correct).count() as i64;
        return Ok(GradeOutcome::Locked { score });
    }

    let previously_correct: HashMap<Uuid, bool> = existing
        .iter()
        .map(|r| (r.question_id, r.is_correct))
        .collect();

    let mut responses = Vec::with_capacity(answers.len());
    let mut score = 0_i64;
    let mut newly_correct = 0_i32;

    for answer in answers {
        let correct_option = correct_by_question
            .get(&answer.question_id)
            .copied()
            .ok_or_else(|| AppError::Internal(anyhow!("graded question disappeared")))?;
        let is_correct = answer.selected_option == correct_option;

        if is_correct {
            score += 1;
            if !previously_correct
                .get(&answer.question_id)
                .copied()
                .unwrap_or(false)
            {
                newly_correct += 1;
            }
        }

        responses.push(GradedAnswer {
            question_id: answer.question_id,
            selected_option: answer.selected_option,
            is_correct,
        });
    }

    Ok(GradeOutcome::Graded {
        responses,
        score,
        newly_correct,
    })
}

fn parse_stored_option(raw: &str) -> AppResult<QuestionOption> {
    QuestionOption::parse(raw)
        .ok_or_else(|| AppError::Internal(anyhow!("invalid stored option {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn response(question_id: Uuid, is_correct: bool) -> ResponseRow {
        ResponseRow {
            question_id,
            selected_option: "a".to_string(),
            is_correct,
        }
    }

    // every question's correct answer is option a
    fn correct_map(ids: &[Uuid]) -> HashMap<Uuid, QuestionOption> {
        ids.iter().map(|id| (*id, QuestionOption::A)).collect()
    }

    fn answer(question_id: Uuid, selected_option: QuestionOption) -> SubmitAnswer {
        SubmitAnswer {
            question_id,
            selected_option,
        }
    }

    #[test]
    fn fully_answered_set_locks_the_original_score() {
        let ids = [qid(1), qid(2), qid(3)];
        let existing = vec![
            response(ids[0], true),
            response(ids[1], false),
            response(ids[2], true),
        ];
        // a repeat submission that would improve the score changes nothing
        let answers = vec![answer(ids[1], QuestionOption::A)];

        let outcome = grade_submission(&answers, &correct_map(&ids), &existing, 3).unwrap();
        assert!(matches!(outcome, GradeOutcome::Locked { score: 2 }));
    }

    #[test]
    fn reanswering_an_already_correct_question_adds_no_new_score() {
        let ids = [qid(1), qid(2)];
        let existing = vec![response(ids[0], true)];
        let answers = vec![answer(ids[0], QuestionOption::A)];

        let outcome = grade_submission(&answers, &correct_map(&ids), &existing, 2).unwrap();
        match outcome {
            GradeOutcome::Graded {
                score,
                newly_correct,
                ..
            } => {
                assert_eq!(score, 1);
                assert_eq!(newly_correct, 0);
            }
            other => panic!("expected graded outcome, got {other:?}"),
        }
    }

    #[test]
    fn correcting_a_previously_wrong_answer_counts_once() {
        let ids = [qid(1), qid(2)];
        let existing = vec![response(ids[0], false)];
        let answers = vec![
            answer(ids[0], QuestionOption::A),
            answer(ids[1], QuestionOption::B),
        ];

        let outcome = grade_submission(&answers, &correct_map(&ids), &existing, 2).unwrap();
        match outcome {
            GradeOutcome::Graded {
                responses,
                score,
                newly_correct,
            } => {
                assert_eq!(score, 1);
                assert_eq!(newly_correct, 1);
                assert!(responses
                    .iter()
                    .any(|graded| graded.question_id == ids[1] && !graded.is_correct));
            }
            other => panic!("expected graded outcome, got {other:?}"),
        }
    }

    #[test]
    fn fresh_submission_counts_every_correct_answer_as_new() {
        let ids = [qid(1), qid(2), qid(3)];
        let answers = vec![
            answer(ids[0], QuestionOption::A),
            answer(ids[1], QuestionOption::C),
            answer(ids[2], QuestionOption::A),
        ];

        let outcome = grade_submission(&answers, &correct_map(&ids), &[], 3).unwrap();
        match outcome {
            GradeOutcome::Graded {
                score,
                newly_correct,
                ..
            } => {
                assert_eq!(score, 2);
                assert_eq!(newly_correct, 2);
            }
            other => panic!("expected graded outcome, got {other:?}"),
        }
    }

    #[test]
    fn unknown_question_id_is_an_internal_error() {
        let ids = [qid(1)];
        let answers = vec![answer(qid(99), QuestionOption::A)];
        assert!(grade_submission(&answers, &correct_map(&ids), &[], 1).is_err());
    }
}
