//! Run configuration.
//!
//! Every tunable lives in one of the structs below and is passed explicitly into
//! the batch routines. Defaults match the values the harvest has historically
//! been run with. Credentials, the storefront host and the translation
//! endpoints can be overridden from the environment.

use crate::error::{HarvestError, Result};
use clap::ValueEnum;
use foldhash::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default storefront host.
pub const DEFAULT_STOREFRONT_URL: &str = "https://store.steampowered.com";

/// Environment variable overriding [`DEFAULT_STOREFRONT_URL`].
pub const STOREFRONT_URL_ENV: &str = "STOREFRONT_BASE_URL";
pub const BAIDU_APP_ID_ENV: &str = "BAIDU_APP_ID";
pub const BAIDU_SECRET_ENV: &str = "BAIDU_SECRET";

/// Upper bound accepted for [`RetryPolicy::max_attempts`].
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Settings for the generic fetch-transform-checkpoint loop.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Output / checkpoint file. Also read at start to skip finished items.
    pub output: PathBuf,
    /// Earlier result files merged (in order) before the output file.
    pub seeds: Vec<PathBuf>,
    /// Checkpoint after this many processed items.
    pub checkpoint_every: usize,
    /// Fixed pause between consecutive items.
    pub item_delay: Duration,
}

impl BatchConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            seeds: Vec::new(),
            checkpoint_every: 50,
            item_delay: Duration::from_millis(1500),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_every == 0 {
            return Err(HarvestError::Config(
                "checkpoint interval must be at least 1".to_string(),
            ));
        }
        if self.seeds.iter().any(|seed| seed == &self.output) {
            return Err(HarvestError::Config(format!(
                "seed file '{}' is the same as the output file",
                self.output.display()
            )));
        }
        Ok(())
    }
}

/// Retry and backoff settings for a single remote item.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Base wait after an HTTP 429.
    pub rate_limit_backoff: Duration,
    /// Added to the 429 wait for every previous attempt.
    pub rate_limit_step: Duration,
    /// Wait after a request timed out.
    pub timeout_backoff: Duration,
    /// Wait after any other transport or status error.
    pub error_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_backoff: Duration::from_secs(30),
            rate_limit_step: Duration::from_secs(10),
            timeout_backoff: Duration::from_secs(5),
            error_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after the `attempt`-th (zero based) request was rate limited.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.rate_limit_backoff + self.rate_limit_step * attempt
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(HarvestError::Config(format!(
                "max attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS_LIMIT, self.max_attempts
            )));
        }
        Ok(())
    }
}

/// Where and how to query the storefront app-details endpoint.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub base_url: String,
    /// Language of the returned text (`l` parameter), e.g. `english`, `schinese`.
    pub locale: String,
    /// Country code for pricing (`cc` parameter), e.g. `us`, `cn`.
    pub region: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STOREFRONT_URL.to_string(),
            locale: "english".to_string(),
            region: "us".to_string(),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        }
    }
}

impl StorefrontConfig {
    /// Defaults with the base URL taken from `STOREFRONT_BASE_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(STOREFRONT_URL_ENV)
            && !url.trim().is_empty()
        {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(HarvestError::Config(
                "request timeout must be non-zero".to_string(),
            ));
        }
        self.retry.validate()
    }
}

/// Translation back-ends, tried in the order given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ProviderKind {
    /// Signed Baidu translate API (needs credentials).
    Baidu,
    /// Anonymous Google `gtx` endpoint.
    Google,
    /// Anonymous MyMemory endpoint.
    Mymemory,
    /// Public LibreTranslate instance.
    Libre,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Baidu => write!(f, "baidu"),
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::Mymemory => write!(f, "mymemory"),
            ProviderKind::Libre => write!(f, "libre"),
        }
    }
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Baidu,
        ProviderKind::Google,
        ProviderKind::Mymemory,
        ProviderKind::Libre,
    ];

    /// Environment variable that overrides this provider's endpoint URL.
    pub fn endpoint_env(self) -> &'static str {
        match self {
            ProviderKind::Baidu => "BAIDU_TRANSLATE_URL",
            ProviderKind::Google => "GOOGLE_TRANSLATE_URL",
            ProviderKind::Mymemory => "MYMEMORY_URL",
            ProviderKind::Libre => "LIBRETRANSLATE_URL",
        }
    }
}

/// Parses a `provider=url` endpoint override, as given on the command line.
pub fn parse_endpoint_override(text: &str) -> Result<(ProviderKind, String)> {
    let Some((name, url)) = text.split_once('=') else {
        return Err(HarvestError::Config(format!(
            "expected PROVIDER=URL, got '{}'",
            text
        )));
    };
    let kind = ProviderKind::from_str(name.trim(), true)
        .map_err(|_| HarvestError::Config(format!("unknown provider '{}'", name.trim())))?;
    let url = url.trim();
    if url.is_empty() {
        return Err(HarvestError::Config(format!("empty endpoint for {}", kind)));
    }
    Ok((kind, url.to_string()))
}

/// Caller-specific Baidu credential pair.
#[derive(Clone, PartialEq)]
pub struct BaiduCredentials {
    pub app_id: String,
    pub secret: String,
}

impl std::fmt::Debug for BaiduCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaiduCredentials")
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl BaiduCredentials {
    /// Reads `BAIDU_APP_ID` / `BAIDU_SECRET`. `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let app_id = std::env::var(BAIDU_APP_ID_ENV).ok()?;
        let secret = std::env::var(BAIDU_SECRET_ENV).ok()?;
        if app_id.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self { app_id, secret })
    }
}

#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub providers: Vec<ProviderKind>,
    pub timeout: Duration,
    pub baidu: Option<BaiduCredentials>,
    /// Endpoint URLs replacing a provider's public default.
    pub endpoints: HashMap<ProviderKind, String>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderKind::Google],
            timeout: Duration::from_secs(10),
            baidu: None,
            endpoints: Default::default(),
        }
    }
}

impl TranslateConfig {
    /// Endpoint overrides from the per-provider `*_URL` variables.
    pub fn endpoints_from_env() -> HashMap<ProviderKind, String> {
        ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let url = std::env::var(kind.endpoint_env()).ok()?;
                let url = url.trim();
                (!url.is_empty()).then(|| (kind, url.to_string()))
            })
            .collect()
    }

    pub fn endpoint(&self, kind: ProviderKind) -> Option<&str> {
        self.endpoints.get(&kind).map(String::as_str)
    }

    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(HarvestError::Config(
                "at least one translation provider is required".to_string(),
            ));
        }
        if self.providers.contains(&ProviderKind::Baidu) && self.baidu.is_none() {
            return Err(HarvestError::Config(format!(
                "the baidu provider needs {} and {}",
                BAIDU_APP_ID_ENV, BAIDU_SECRET_ENV
            )));
        }
        if self.timeout.is_zero() {
            return Err(HarvestError::Config(
                "request timeout must be non-zero".to_string(),
            ));
        }
        if let Some((kind, _)) = self.endpoints.iter().find(|(_, url)| url.trim().is_empty()) {
            return Err(HarvestError::Config(format!("empty endpoint for {}", kind)));
        }
        Ok(())
    }
}
