use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use sqlx::PgPool;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    config::GeneratorConfig,
    model::GenerateResult,
    repo, similarity,
    util::{date, gemini::GeminiClient},
};

/// Spawn the daily generation job. Every tick it checks whether today's set
/// (IST) exists yet and fills the gap if it doesn't, so a missed run catches
/// up on the next tick instead of waiting for tomorrow.
pub fn spawn(
    pool: PgPool,
    config: GeneratorConfig,
    gemini: Option<Arc<GeminiClient>>,
) -> anyhow::Result<()> {
    let generator = Generator::new(pool, config, gemini);
    tokio::spawn(async move {
        if let Err(err) = generator.run().await {
            tracing::error!(error = ?err, "question generator stopped");
        }
    });
    Ok(())
}

struct Generator {
    pool: PgPool,
    config: GeneratorConfig,
    gemini: Option<Arc<GeminiClient>>,
}

impl Generator {
    fn new(pool: PgPool, mut config: GeneratorConfig, gemini: Option<Arc<GeminiClient>>) -> Self {
        if config.interval_secs == 0 {
            config.interval_secs = 60;
        }
        Self {
            pool,
            config,
            gemini,
        }
    }

    async fn run(self) -> anyhow::Result<()> {
        let Some(gemini) = self.gemini else {
            warn!("gemini api key not configured, daily question generation disabled");
            return Ok(());
        };

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let today = date::today_ist();
            match repo::question_sets::get_by_date(&self.pool, today).await {
                Ok(Some(_)) => {
                    debug!(%today, "question set already present, nothing to do");
                }
                Ok(None) => {
                    if let Err(err) =
                        run_generation(&self.pool, &gemini, &self.config, today, false).await
                    {
                        warn!(%today, error = %err, "daily generation failed, will retry");
                    }
                }
                Err(err) => {
                    warn!(%today, error = %err, "could not check for today's question set");
                }
            }
        }
    }
}

/// The generation pipeline: load the recent-question corpus, fetch a
/// candidate batch, keep the candidates least similar to the corpus, persist.
///
/// With `force` an existing set for the date is deleted first (cascading to
/// its questions and responses); without it an existing set is an error.
pub async fn run_generation(
    pool: &PgPool,
    gemini: &GeminiClient,
    config: &GeneratorConfig,
    set_date: NaiveDate,
    force: bool,
) -> anyhow::Result<GenerateResult> {
    if repo::question_sets::get_by_date(pool, set_date).await?.is_some() {
        if !force {
            bail!("question set for {set_date} already exists");
        }
        repo::question_sets::delete_by_date(pool, set_date).await?;
        info!(%set_date, "deleted existing question set for regeneration");
    }

    let corpus_since = set_date - chrono::Duration::days(config.corpus_window_days);
    let corpus = repo::question_sets::recent_contents(pool, corpus_since)
        .await
        .context("failed to load recent question corpus")?;

    let candidates = gemini
        .generate_questions(config.batch_size, &corpus)
        .await
        .context("question generation failed")?;

    // Strict dedup first; when that leaves too few candidates for a full
    // set, fall back to ranking the whole batch so the day still gets one.
    let screened =
        similarity::filter_duplicates(candidates.clone(), &corpus, config.similarity_threshold);
    let selected = if screened.len() >= config.target_count {
        similarity::select_least_similar(screened, &corpus, config.target_count)
    } else {
        warn!(
            screened = screened.len(),
            target = config.target_count,
            threshold = config.similarity_threshold,
            "too few candidates survive strict dedup, ranking the full batch"
        );
        similarity::select_least_similar(candidates, &corpus, config.target_count)
    };

    let set_id = repo::question_sets::insert_set_with_questions(pool, set_date, &selected)
        .await
        .context("failed to persist question set")?;

    info!(
        %set_date,
        %set_id,
        corpus_size = corpus.len(),
        selected = selected.len(),
        "question set generated"
    );

    Ok(GenerateResult {
        date: set_date,
        question_count: selected.len(),
    })
}
