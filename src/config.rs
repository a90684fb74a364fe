//! Configuration file parser for ~/.config/rss-digest/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`, which
//! carries the built-in topic list. Unknown keys are silently ignored by serde, though
//! we log a warning when the file contains potential typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::util::validate_url;

/// Environment variable that overrides `delivery.api_key`.
pub const API_KEY_ENV: &str = "RESEND_API_KEY";
/// Environment variable that overrides `delivery.segment_id`.
pub const SEGMENT_ENV: &str = "RESEND_SEGMENT_ID";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Values parsed but do not make sense together.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Topic used when none is given on the command line.
    pub topic: String,

    /// Topic name → feed URLs, fetched in the listed order.
    pub topics: BTreeMap<String, Vec<String>>,

    pub fetch: FetchConfig,
    pub selection: SelectionConfig,
    pub digest: DigestConfig,
    pub delivery: DeliveryConfig,
}

/// HTTP settings for feed requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// `User-Agent` header sent with every feed request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Which items make it into a digest.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// First recency window, in hours.
    pub window_hours: u32,
    /// Wider window used when the first one yields fewer than `min_items`.
    pub fallback_window_hours: u32,
    /// Minimum number of items before the window is widened.
    pub min_items: usize,
    /// Maximum number of items in a digest.
    pub max_items: usize,
    /// Only keep items mentioning this keyword (category, title or description).
    pub keyword: Option<String>,
}

/// Text used in the rendered digest.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Heading at the top of the document (also the HTML title).
    pub heading: String,
    /// Subject line prefix; the date is appended.
    pub subject: String,
    /// Footer text, shown after the copyright year.
    pub footer: String,
}

/// Email provider settings.
///
/// Custom Debug impl masks `api_key` to prevent secret leakage in logs,
/// error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Provider API key (alternative to the RESEND_API_KEY env var).
    /// Env var takes precedence over config file.
    pub api_key: Option<String>,
    /// Audience segment that receives the broadcast.
    pub segment_id: Option<String>,
    /// Sender, e.g. `Daily News <news@example.com>`.
    pub from: String,
    /// Provider API base URL.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: "tech".to_string(),
            topics: default_topics(),
            fetch: FetchConfig::default(),
            selection: SelectionConfig::default(),
            digest: DigestConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; DailyNewsBot/1.0)".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            fallback_window_hours: 36,
            min_items: 5,
            max_items: 10,
            keyword: None,
        }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            heading: "Daily Tech News Digest".to_string(),
            subject: "Your Daily News".to_string(),
            footer: "Daily News Digest. All rights reserved.".to_string(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            segment_id: None,
            from: "Daily News <news@example.com>".to_string(),
            base_url: "https://api.resend.com".to_string(),
        }
    }
}

/// Mask api_key in Debug output to prevent secret leakage.
impl std::fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("segment_id", &self.segment_id)
            .field("from", &self.from)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_topics() -> BTreeMap<String, Vec<String>> {
    let topics: [(&str, &[&str]); 3] = [
        (
            "ai",
            &["https://news.ycombinator.com/rss", "https://techcrunch.com/feed/"],
        ),
        (
            "tech",
            &[
                "https://www.theverge.com/rss/index.xml",
                "https://www.wired.com/feed/rss",
            ],
        ),
        (
            "startups",
            &[
                "https://news.ycombinator.com/rss",
                "https://techcrunch.com/category/startups/feed/",
            ],
        ),
    ];

    topics
        .into_iter()
        .map(|(name, urls)| {
            (
                name.to_string(),
                urls.iter().map(|u| u.to_string()).collect(),
            )
        })
        .collect()
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] =
        ["topic", "topics", "fetch", "selection", "digest", "delivery"];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    /// - Parsed values are checked with [`Config::validate`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            topics = config.topics.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every feed URL is an http(s) URL and the selection limits agree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (topic, urls) in &self.topics {
            for url in urls {
                validate_url(url).map_err(|e| {
                    ConfigError::Invalid(format!("topic '{}': {} ({})", topic, url, e))
                })?;
            }
        }

        let selection = &self.selection;
        if selection.fallback_window_hours < selection.window_hours {
            return Err(ConfigError::Invalid(format!(
                "selection.fallback_window_hours ({}) is shorter than selection.window_hours ({})",
                selection.fallback_window_hours, selection.window_hours
            )));
        }
        if selection.max_items == 0 {
            return Err(ConfigError::Invalid(
                "selection.max_items must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch.timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Feed URLs configured for `topic`.
    pub fn topic_urls(&self, topic: &str) -> Option<&[String]> {
        self.topics.get(topic).map(Vec::as_slice)
    }

    /// Provider API key, from the environment first and the config file second.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.delivery.api_key.clone())
            .map(SecretString::from)
    }

    /// Broadcast segment, from the environment first and the config file second.
    pub fn segment_id(&self) -> Option<String> {
        std::env::var(SEGMENT_ENV)
            .ok()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.delivery.segment_id.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
