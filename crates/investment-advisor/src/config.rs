//! Configuration for the investment advisor

use crate::error::{AdvisorError, Result};
use crate::retry::RetryPolicy;
use advisor_llm::providers::openai::DEFAULT_API_BASE;
use advisor_utils::{env_parse, env_string};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration shared by the collaborators, the pipeline and the report writer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Chat model identifier
    pub model: String,

    /// Sampling temperature for every generation call
    pub temperature: f32,

    /// Token ceiling per generation call
    pub max_tokens: usize,

    /// API key for the text-generation service
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    pub api_base: String,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Articles requested per news search
    pub news_max_results: usize,

    /// Results joined into the company overview
    pub overview_max_results: usize,

    /// Statement periods fetched for income statement and balance sheet
    pub statement_periods: usize,

    /// Attempts per collaborator call, first try included
    pub max_retries: u32,

    /// Delay before the first retry; doubles each attempt
    pub retry_backoff_base: Duration,

    /// Web searches allowed per minute
    pub search_rate_limit: u32,

    /// Root directory for reports and logs
    pub output_dir: PathBuf,

    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            news_max_results: 5,
            overview_max_results: 3,
            statement_periods: 4,
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            search_rate_limit: 30,
            output_dir: PathBuf::from("outputs"),
            log_level: "info".to_string(),
        }
    }
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Defaults overlaid with `GROQ_*`, `LOG_LEVEL` and `ADVISOR_OUTPUT_DIR`
    ///
    /// Does not validate; a missing API key is only an error once generation is needed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.api_key = env_string("GROQ_API_KEY");
        if let Some(model) = env_string("GROQ_MODEL") {
            config.model = model;
        }
        if let Some(temperature) = parse_var::<f32>("GROQ_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Some(api_base) = env_string("GROQ_API_BASE") {
            config.api_base = api_base;
        }
        if let Some(level) = env_string("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(dir) = env_string("ADVISOR_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(AdvisorError::Config(
                "GROQ_API_KEY is required for text generation".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AdvisorError::Config(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }

        if self.max_retries == 0 {
            return Err(AdvisorError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.news_max_results == 0 {
            return Err(AdvisorError::Config(
                "news_max_results must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry wrapper for collaborator calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_backoff_base, MAX_BACKOFF, 2.0)
    }

    /// Directory for analysis reports
    pub fn analysis_dir(&self) -> PathBuf {
        self.output_dir.join("analysis")
    }

    /// Directory for recommendation reports
    pub fn recommendation_dir(&self) -> PathBuf {
        self.output_dir.join("recommendations")
    }

    /// Directory for log files
    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }

    /// Create the output directory tree
    pub fn create_directories(&self) -> Result<()> {
        for dir in [
            self.analysis_dir(),
            self.recommendation_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_parse(name).map_err(|e| AdvisorError::Config(e.to_string()))
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    api_key: Option<String>,
    api_base: Option<String>,
    request_timeout: Option<Duration>,
    news_max_results: Option<usize>,
    overview_max_results: Option<usize>,
    statement_periods: Option<usize>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    search_rate_limit: Option<u32>,
    output_dir: Option<PathBuf>,
    log_level: Option<String>,
}

impl AdvisorConfigBuilder {
    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token ceiling
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set articles per news search
    pub fn news_max_results(mut self, n: usize) -> Self {
        self.news_max_results = Some(n);
        self
    }

    /// Set results used for the company overview
    pub fn overview_max_results(mut self, n: usize) -> Self {
        self.overview_max_results = Some(n);
        self
    }

    /// Set statement periods
    pub fn statement_periods(mut self, n: usize) -> Self {
        self.statement_periods = Some(n);
        self
    }

    /// Set maximum attempts
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set searches per minute
    pub fn search_rate_limit(mut self, per_minute: u32) -> Self {
        self.search_rate_limit = Some(per_minute);
        self
    }

    /// Set the output root
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the default log level
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Load the API key from `GROQ_API_KEY` when not set explicitly
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = env_string("GROQ_API_KEY");
        }
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            api_key: self.api_key,
            api_base: self.api_base.unwrap_or(defaults.api_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            news_max_results: self.news_max_results.unwrap_or(defaults.news_max_results),
            overview_max_results: self
                .overview_max_results
                .unwrap_or(defaults.overview_max_results),
            statement_periods: self.statement_periods.unwrap_or(defaults.statement_periods),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            search_rate_limit: self.search_rate_limit.unwrap_or(defaults.search_rate_limit),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            log_level: self.log_level.unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdvisorConfig::default();
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.news_max_results, 5);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.api_base, "https://api.groq.com/openai/v1");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_builder() {
        let config = AdvisorConfig::builder()
            .api_key("gsk-test")
            .model("llama-3.3-70b-versatile")
            .temperature(0.3)
            .max_retries(5)
            .output_dir("/tmp/advisor")
            .build()
            .unwrap();

        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.analysis_dir(), PathBuf::from("/tmp/advisor/analysis"));
        assert_eq!(
            config.recommendation_dir(),
            PathBuf::from("/tmp/advisor/recommendations")
        );
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/advisor/logs"));
    }

    #[test]
    fn test_validation_requires_api_key() {
        let result = AdvisorConfig::builder().build();
        assert!(matches!(result, Err(AdvisorError::Config(_))));

        let result = AdvisorConfig::builder().api_key("   ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_ranges() {
        assert!(
            AdvisorConfig::builder()
                .api_key("k")
                .temperature(2.5)
                .build()
                .is_err()
        );
        assert!(
            AdvisorConfig::builder()
                .api_key("k")
                .max_retries(0)
                .build()
                .is_err()
        );
        assert!(
            AdvisorConfig::builder()
                .api_key("k")
                .news_max_results(0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = AdvisorConfig::builder()
            .api_key("k")
            .max_retries(4)
            .retry_backoff_base(Duration::from_millis(250))
            .build()
            .unwrap();

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_backoff, Duration::from_millis(250));
        assert_eq!(policy.max_backoff, Duration::from_secs(30));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = AdvisorConfig::builder().api_key("secret").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
