use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

/// Tuning for the daily question-generation pipeline. The 12-candidate batch,
/// keep-10 target, 0.45 dedup threshold and 3-day corpus window are empirical
/// values carried over from production; none of them is derived.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub interval_secs: u64,
    pub batch_size: usize,
    pub target_count: usize,
    pub similarity_threshold: f32,
    pub corpus_window_days: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            batch_size: 12,
            target_count: 10,
            similarity_threshold: 0.45,
            corpus_window_days: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Tried in order until one answers; newest models first.
    pub models: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CronConfig {
    /// Bearer token required on the generation endpoints.
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/quiz_backend.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub generator: GeneratorConfig,
    pub gemini: GeminiConfig,
    pub cron: CronConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else if let Some(path) = locate_default_config() {
            Self::load_from_file(&path)?
        } else {
            AppConfig::default()
        };

        Self::apply_env_overrides(config)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        Ok(config)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.db.url = url;
        }

        if let Some(max_conn) = parse_optional_env("DB_MAX_CONNECTIONS")? {
            config.db.max_connections = max_conn;
        }

        if let Some(interval) = parse_optional_env("GENERATOR_INTERVAL_SECS")? {
            config.generator.interval_secs = interval;
        }

        if let Some(batch) = parse_optional_env("GENERATOR_BATCH_SIZE")? {
            config.generator.batch_size = batch;
        }

        if let Some(target) = parse_optional_env("GENERATOR_TARGET_COUNT")? {
            config.generator.target_count = target;
        }

        if let Some(threshold) = parse_optional_env("GENERATOR_SIMILARITY_THRESHOLD")? {
            config.generator.similarity_threshold = threshold;
        }

        if let Some(window) = parse_optional_env("GENERATOR_CORPUS_WINDOW_DAYS")? {
            config.generator.corpus_window_days = window;
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = Some(api_key);
        }

        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.gemini.base_url = base_url;
        }

        if let Some(timeout) = parse_optional_env("GEMINI_TIMEOUT_SECS")? {
            config.gemini.timeout_secs = timeout;
        }

        if let Ok(secret) = std::env::var("CRON_SECRET") {
            config.cron.secret = Some(secret);
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        if config.db.url.trim().is_empty() {
            return Err(anyhow!(
                "database url missing; set DATABASE_URL env var or db.url in config file"
            ));
        }

        if config.generator.batch_size < config.generator.target_count {
            return Err(anyhow!(
                "generator batch_size ({}) must not be below target_count ({})",
                config.generator.batch_size,
                config.generator.target_count
            ));
        }

        Ok(config)
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(
            v.parse::<T>()
                .with_context(|| format!("{key} must be a valid value"))?,
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    candidates.into_iter().find(|path| path.exists())
}
