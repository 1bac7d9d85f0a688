use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::similarity::HasContent;

/// Answer slot of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOption {
    A,
    B,
    C,
    D,
}

impl QuestionOption {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionOption::A => "a",
            QuestionOption::B => "b",
            QuestionOption::C => "c",
            QuestionOption::D => "d",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "a" => Some(QuestionOption::A),
            "b" => Some(QuestionOption::B),
            "c" => Some(QuestionOption::C),
            "d" => Some(QuestionOption::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

/// Freshly generated candidate question, before dedup screening.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    pub content: String,
    pub options: QuestionOptions,
    pub correct_option: QuestionOption,
    pub explanation: String,
    pub category: String,
}

impl HasContent for GeneratedQuestion {
    fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponseOut {
    pub selected_option: QuestionOption,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: Uuid,
    pub content: String,
    pub options: QuestionOptions,
    pub correct_option: QuestionOption,
    pub explanation: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_response: Option<UserResponseOut>,
}

#[derive(Debug, Serialize)]
pub struct QuestionSetOut {
    pub set_id: Uuid,
    pub date: NaiveDate,
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuestionSetQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub streak_count: i32,
    pub total_score: i32,
    pub last_active_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswer {
    pub question_id: Uuid,
    pub selected_option: QuestionOption,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPayload {
    pub user_id: Uuid,
    pub answers: Vec<SubmitAnswer>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResult {
    pub score: i64,
    pub total_questions: i64,
    pub streak_count: i32,
    pub score_locked: bool,
}

#[derive(Debug, Serialize)]
pub struct UserStatsOut {
    pub streak_count: i32,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub accuracy: f64,
    pub last_active_date: Option<NaiveDate>,
    pub historical_average_score: f64,
    pub historical_attempts: i64,
}

#[derive(Debug, Serialize)]
pub struct CompletedDatesOut {
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EarliestDateOut {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResult {
    pub date: NaiveDate,
    pub question_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_option_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&QuestionOption::C).unwrap(), "\"c\"");
        let parsed: QuestionOption = serde_json::from_str("\"b\"").unwrap();
        assert_eq!(parsed, QuestionOption::B);
    }

    #[test]
    fn question_option_round_trips_text_column_values() {
        for raw in ["a", "b", "c", "d"] {
            let option = QuestionOption::parse(raw).unwrap();
            assert_eq!(option.as_str(), raw);
        }
        assert!(QuestionOption::parse("e").is_none());
    }

    #[test]
    fn generated_question_parses_the_generator_shape() {
        let json = r#"{
            "content": "Which country hosted the most recent G20 summit?",
            "options": {"a": "India", "b": "Brazil", "c": "Italy", "d": "Japan"},
            "correct_option": "b",
            "explanation": "The summit was hosted in Rio de Janeiro.",
            "category": "current_affairs"
        }"#;
        let question: GeneratedQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(question.correct_option, QuestionOption::B);
        assert_eq!(question.options.a, "India");
    }
}
