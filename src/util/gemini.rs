use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{config::GeminiConfig, model::GeneratedQuestion, util::date};

/// Prompt caps carried over from production tuning: at most 30 recent
/// questions quoted, each clipped to 150 characters.
const MAX_PROMPT_EXCLUSIONS: usize = 30;
const EXCLUSION_EXCERPT_CHARS: usize = 150;

/// Minimum lengths the generated fields must clear to be usable.
const MIN_CONTENT_CHARS: usize = 10;
const MIN_EXPLANATION_CHARS: usize = 10;

pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build gemini http client")?;

        Ok(Self { http, config })
    }

    /// Ask for a batch of candidate questions, quoting `recent_contents` in
    /// the prompt so the model steers away from recently asked topics. The
    /// configured models are tried in order; the first parsable answer wins.
    pub async fn generate_questions(
        &self,
        batch_size: usize,
        recent_contents: &[String],
    ) -> Result<Vec<GeneratedQuestion>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("gemini api key missing"))?;

        let prompt = build_question_prompt(Utc::now(), batch_size, recent_contents);
        let mut last_error: Option<anyhow::Error> = None;

        for model in &self.config.models {
            match self
                .request_model(api_key, model, &prompt, batch_size)
                .await
            {
                Ok(batch) => {
                    tracing::info!(model, count = batch.len(), "gemini batch generated");
                    return Ok(batch);
                }
                Err(err) => {
                    warn!(model, error = %err, "gemini model failed, trying next");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("no gemini models configured")))
    }

    async fn request_model(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        expected: usize,
    ) -> Result<Vec<GeneratedQuestion>> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = format!("{base}/v1beta/models/{model}:generateContent");

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "gemini returned non-success status {}: {}",
                status,
                text
            ));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .context("failed to parse gemini response")?;

        let content = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| anyhow!("gemini response missing content parts"))?;

        parse_question_batch(&content, expected)
    }
}

/// Parse the model's answer into a validated question batch. The answer is
/// expected to be a JSON array, possibly wrapped in markdown code fences.
pub(crate) fn parse_question_batch(
    content: &str,
    expected: usize,
) -> Result<Vec<GeneratedQuestion>> {
    let json_str = strip_code_fences(content);

    let batch: Vec<GeneratedQuestion> = serde_json::from_str(json_str)
        .or_else(|_| serde_json::from_str(content.trim()))
        .context("gemini answer is not a valid question array")?;

    if batch.len() != expected {
        return Err(anyhow!(
            "gemini returned {} questions, expected {}",
            batch.len(),
            expected
        ));
    }

    for (index, question) in batch.iter().enumerate() {
        validate_question(question)
            .with_context(|| format!("generated question {} failed validation", index + 1))?;
    }

    Ok(batch)
}

pub(crate) fn strip_code_fences(content: &str) -> &str {
    content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn validate_question(question: &GeneratedQuestion) -> Result<()> {
    if question.content.trim().chars().count() < MIN_CONTENT_CHARS {
        return Err(anyhow!("question content too short"));
    }
    let options = [
        &question.options.a,
        &question.options.b,
        &question.options.c,
        &question.options.d,
    ];
    if options.iter().any(|option| option.trim().is_empty()) {
        return Err(anyhow!("question has an empty option"));
    }
    if question.explanation.trim().chars().count() < MIN_EXPLANATION_CHARS {
        return Err(anyhow!("question explanation too short"));
    }
    if question.category.trim().is_empty() {
        return Err(anyhow!("question category missing"));
    }
    Ok(())
}

/// Build the generation prompt with the IST date window and the dedup
/// exclusion list.
pub(crate) fn build_question_prompt(
    now: DateTime<Utc>,
    batch_size: usize,
    recent_contents: &[String],
) -> String {
    let current = date::to_ist(now).format("%B %-d, %Y, %-I:%M %p IST");
    let window_start = date::to_ist(now - chrono::Duration::hours(72))
        .format("%B %-d, %Y, %-I:%M %p IST");
    let oldest_allowed = date::to_ist(now - chrono::Duration::days(7))
        .format("%B %-d, %Y, %-I:%M %p IST");

    let mut prompt = format!(
        "You are an expert at creating general-knowledge multiple choice questions \
for a daily quiz.\n\n\
CURRENT DATE CONTEXT (IST - Indian Standard Time):\n\
- Current date and time: {current}\n\
- Preferred news window: last 72 hours (from {window_start})\n\
- Maximum allowed news age: 1 week (nothing older than {oldest_allowed})\n\n\
Generate exactly {batch_size} high-quality MCQs mixing recent current affairs \
with static general knowledge (constitution, history, economics, geography, \
science and technology, sports, awards).\n\n\
Question requirements:\n\
- Clear, concise, unambiguous question text\n\
- Exactly 4 plausible options (a, b, c, d) and one correct option\n\
- A factual explanation of the correct answer\n\
- Current-affairs questions must be from the allowed news window\n\n\
Output format: return ONLY a JSON array of exactly {batch_size} objects, \
no markdown and no extra text. Each object:\n\
{{\"content\": \"...\", \"options\": {{\"a\": \"...\", \"b\": \"...\", \
\"c\": \"...\", \"d\": \"...\"}}, \"correct_option\": \"a\", \
\"explanation\": \"...\", \"category\": \"current_affairs\"}}\n"
    );

    if !recent_contents.is_empty() {
        prompt.push_str(
            "\nAVOID DUPLICATES - these questions or very similar topics were \
already asked recently. Do NOT create questions similar to or about the same \
topic as:\n",
        );
        for (index, content) in recent_contents
            .iter()
            .take(MAX_PROMPT_EXCLUSIONS)
            .enumerate()
        {
            let excerpt: String = content.chars().take(EXCLUSION_EXCERPT_CHARS).collect();
            let ellipsis = if content.chars().count() > EXCLUSION_EXCERPT_CHARS {
                "..."
            } else {
                ""
            };
            prompt.push_str(&format!("{}. {}{}\n", index + 1, excerpt, ellipsis));
        }
        prompt.push_str(
            "Generate completely different questions on other recent news or \
static GK topics.\n",
        );
    }

    prompt.push_str(&format!("\nGenerate {batch_size} questions now:"));
    prompt
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_question_json(content: &str) -> String {
        format!(
            r#"{{
                "content": "{content}",
                "options": {{"a": "one", "b": "two", "c": "three", "d": "four"}},
                "correct_option": "a",
                "explanation": "Because option one is the documented answer.",
                "category": "geography"
            }}"#
        )
    }

    #[test]
    fn strips_json_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn parses_a_fenced_batch() {
        let body = format!(
            "```json\n[{}, {}]\n```",
            sample_question_json("Which river is the longest in the world?"),
            sample_question_json("Which planet has the strongest winds recorded?")
        );
        let batch = parse_question_batch(&body, 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].category, "geography");
    }

    #[test]
    fn rejects_wrong_batch_size() {
        let body = format!("[{}]", sample_question_json("Which ocean is the deepest one?"));
        assert!(parse_question_batch(&body, 2).is_err());
    }

    #[test]
    fn rejects_short_content() {
        let body = format!("[{}]", sample_question_json("Too short"));
        assert!(parse_question_batch(&body, 1).is_err());
    }

    #[test]
    fn rejects_empty_option() {
        let body = r#"[{
            "content": "Which mountain is the tallest on earth?",
            "options": {"a": "", "b": "K2", "c": "Everest", "d": "Denali"},
            "correct_option": "c",
            "explanation": "Everest is the tallest above sea level.",
            "category": "geography"
        }]"#;
        assert!(parse_question_batch(body, 1).is_err());
    }

    #[test]
    fn prompt_quotes_recent_questions_and_caps_them() {
        let now = Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap();
        let recent: Vec<String> = (0..40)
            .map(|i| format!("Recently asked question number {i}?"))
            .collect();
        let prompt = build_question_prompt(now, 12, &recent);

        assert!(prompt.contains("exactly 12"));
        assert!(prompt.contains("AVOID DUPLICATES"));
        assert!(prompt.contains("Recently asked question number 29?"));
        assert!(!prompt.contains("Recently asked question number 30?"));
    }

    #[test]
    fn prompt_without_corpus_has_no_exclusion_section() {
        let now = Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap();
        let prompt = build_question_prompt(now, 10, &[]);
        assert!(!prompt.contains("AVOID DUPLICATES"));
    }
}
