//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Production API host.
pub const DEFAULT_HOST: &str = "https://api.music.ai";

/// How downloaded result files are named inside the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// `<result name>.<extension from URL>`
    #[default]
    ResultName,
    /// Literal file name from the URL
    UrlFilename,
    /// `<result name>/<file name from URL>`
    FolderPerResult,
}

impl NamingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingMode::ResultName => "result-name",
            NamingMode::UrlFilename => "url-filename",
            NamingMode::FolderPerResult => "folder-per-result",
        }
    }
}

impl FromStr for NamingMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "result-name" | "result_name" | "name" => Ok(NamingMode::ResultName),
            "url-filename" | "url_filename" | "filename" => Ok(NamingMode::UrlFilename),
            "folder-per-result" | "folder_per_result" | "folder" => Ok(NamingMode::FolderPerResult),
            other => Err(ClientError::config(format!("unknown naming mode '{}'", other))),
        }
    }
}

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// API key, sent verbatim as the `Authorization` header
    pub api_key: String,
    /// API root, e.g. `https://api.music.ai/api`
    pub base_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Interval between status polls when waiting for a job
    pub poll_interval: Duration,
    /// Naming of downloaded result files
    pub naming_mode: NamingMode,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("naming_mode", &self.naming_mode)
            .finish()
    }
}

impl ClientConfig {
    /// Config for the production host with default timings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url_for_host(DEFAULT_HOST),
            timeout: Duration::from_secs(300), // large uploads/downloads
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            naming_mode: NamingMode::default(),
        }
    }

    /// Point at another host. `/api` is appended.
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.base_url = base_url_for_host(host.as_ref());
        self
    }

    /// Use an exact API root (no `/api` suffix added).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_naming_mode(mut self, mode: NamingMode) -> Self {
        self.naming_mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var("MUSIC_AI_API_KEY")
            .map_err(|_| ClientError::config("MUSIC_AI_API_KEY must be set"))?;

        let host = std::env::var("MUSIC_AI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let naming_mode = match std::env::var("MUSIC_AI_NAMING_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => NamingMode::default(),
        };

        let config = Self {
            api_key,
            base_url: base_url_for_host(&host),
            timeout: Duration::from_secs(env_u64("MUSIC_AI_TIMEOUT_SECS").unwrap_or(300)),
            connect_timeout: Duration::from_secs(
                env_u64("MUSIC_AI_CONNECT_TIMEOUT_SECS").unwrap_or(10),
            ),
            poll_interval: Duration::from_secs(env_u64("MUSIC_AI_POLL_INTERVAL_SECS").unwrap_or(2)),
            naming_mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot produce a working client.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::config("API key cannot be empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ClientError::config("poll interval must be greater than zero"));
        }
        Ok(())
    }
}

fn base_url_for_host(host: &str) -> String {
    format!("{}/api", host.trim_end_matches('/'))
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
