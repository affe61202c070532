use std::time::Duration;

use crate::error::{LabelbaseError, Result};

/// Cloud-hosted Labelbase API.
pub const DEFAULT_BASE_URL: &str = "https://labelbase.space/api/v0";

/// A Labelbase instance running on the local machine.
pub const LOCAL_BASE_URL: &str = "http://127.0.0.1:8080/api/v0";

const ENV_API_KEY: &str = "LABELBASE_API_KEY";
const ENV_BASE_URL: &str = "LABELBASE_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "LABELBASE_TIMEOUT_SECS";
const ENV_BODY_ENCODING: &str = "LABELBASE_BODY_ENCODING";

/// How request bodies for POST/PUT are encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/json`
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl std::str::FromStr for BodyEncoding {
    type Err = LabelbaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "form" => Ok(Self::Form),
            other => Err(LabelbaseError::Config {
                message: format!("unknown body encoding '{other}' (expected 'json' or 'form')"),
            }),
        }
    }
}

/// Connection settings for [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout; `None` leaves reqwest's default in place.
    pub timeout: Option<Duration>,
    pub encoding: BodyEncoding,
}

impl ClientConfig {
    /// Settings for the cloud-hosted API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            encoding: BodyEncoding::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Load settings from `LABELBASE_*` environment variables.
    ///
    /// `LABELBASE_API_KEY` is required; `LABELBASE_BASE_URL`,
    /// `LABELBASE_TIMEOUT_SECS` and `LABELBASE_BODY_ENCODING` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LabelbaseError::Config {
                message: format!("{ENV_API_KEY} is not set"),
            })?;

        let mut config = Self::new(api_key.trim());

        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| LabelbaseError::Config {
                message: format!("{ENV_TIMEOUT_SECS}='{raw}' is not a whole number of seconds: {e}"),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup(ENV_BODY_ENCODING) {
            config.encoding = raw.parse()?;
        }

        Ok(config)
    }
}
