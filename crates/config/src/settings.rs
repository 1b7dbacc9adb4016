// Application settings
// Loaded from ~/.config/vinrec/config.toml (or --config)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use vinrec_recon::{StatusCodes, TypeFilter};

use crate::error::ConfigError;

pub const DEFAULT_DEALER_URL: &str = "https://feeds.amp.auto/feeds/coxautomotive/dealerdotcom.csv";
pub const DEFAULT_MANUFACTURER_BASE: &str = "https://feeds.amp.auto/feeds/vinsolutions";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const MAX_WORKERS: usize = 32;

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

/// What to do when a feed download fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedErrorPolicy {
    /// Stop the run.
    #[default]
    Abort,
    /// Warn and continue with an empty table.
    Empty,
}

impl std::fmt::Display for FeedErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Dealer (website syndication) feed URL
    pub dealer_url: String,
    /// Manufacturer feed base; the selected filename is appended
    pub manufacturer_base: String,
    /// Allowed manufacturer feed filenames (empty = any)
    pub known_feeds: Vec<String>,
    /// Default type filter for the manufacturer feed
    pub manufacturer_type: TypeFilter,
    /// Default type filter for the dealer feed
    pub dealer_type: TypeFilter,
    pub on_error: FeedErrorPolicy,
    pub timeout_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            dealer_url: DEFAULT_DEALER_URL.into(),
            manufacturer_base: DEFAULT_MANUFACTURER_BASE.into(),
            known_feeds: vec!["garberchevroletmidland-8710.csv".into()],
            manufacturer_type: TypeFilter::All,
            dealer_type: TypeFilter::Used,
            on_error: FeedErrorPolicy::Abort,
            timeout_secs: 30,
        }
    }
}

impl FeedSettings {
    /// Resolve `<manufacturer_base>/<filename>`, checking `known_feeds`.
    pub fn manufacturer_url(&self, filename: &str) -> Result<String, ConfigError> {
        if filename.is_empty() || filename.contains('/') {
            return Err(ConfigError::Validation(format!("invalid feed filename '{filename}'")));
        }
        if !self.known_feeds.is_empty() && !self.known_feeds.iter().any(|f| f == filename) {
            return Err(ConfigError::UnknownFeed {
                name: filename.into(),
                known: self.known_feeds.clone(),
            });
        }
        Ok(format!("{}/{}", self.manufacturer_base.trim_end_matches('/'), filename))
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// How the VIN is sent to the lookup service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupBinding {
    /// GET with `vin` and the fixed params as query parameters.
    #[default]
    Get,
    /// POST with a `{"vin": ...}` JSON body.
    Post,
}

impl std::fmt::Display for LookupBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    pub enabled: bool,
    pub binding: LookupBinding,
    /// Lookup endpoint. Required when `enabled`.
    pub url: String,
    /// Fixed query parameters (locale, postal code, ...)
    pub params: BTreeMap<String, String>,
    /// Literal request headers
    pub headers: BTreeMap<String, String>,
    /// Header name -> environment variable holding its value
    pub env_headers: BTreeMap<String, String>,
    pub in_transit_code: String,
    pub courtesy_code: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub workers: usize,
}

impl Default for LookupSettings {
    fn default() -> Self {
        let codes = StatusCodes::default();
        let mut params = BTreeMap::new();
        params.insert("locale".into(), "en_US".into());
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".into(), BROWSER_USER_AGENT.into());
        headers.insert("Accept".into(), "application/json, text/plain, */*".into());

        Self {
            enabled: true,
            binding: LookupBinding::Get,
            url: String::new(),
            params,
            headers,
            env_headers: BTreeMap::new(),
            in_transit_code: codes.in_transit,
            courtesy_code: codes.courtesy,
            timeout_secs: 30,
            max_retries: 0,
            workers: 1,
        }
    }
}

impl LookupSettings {
    pub fn status_codes(&self) -> StatusCodes {
        StatusCodes {
            in_transit: self.in_transit_code.clone(),
            courtesy: self.courtesy_code.clone(),
        }
    }

    /// The endpoint, or an error naming the missing setting.
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "lookup.url is not set (configure it or disable the lookup)".into(),
            ));
        }
        Ok(self.url.trim())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub results_file: PathBuf,
    pub summary_file: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            results_file: PathBuf::from("reconciliation_results.csv"),
            summary_file: PathBuf::from("issue_breakdown.csv"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feeds: FeedSettings,
    pub lookup: LookupSettings,
    pub output: OutputSettings,
}

impl Settings {
    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vinrec")
            .join("config.toml")
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from an explicit path, or the default path if present.
    /// A missing default file yields built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::config_path();
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url("feeds.dealer_url", &self.feeds.dealer_url)?;
        check_http_url("feeds.manufacturer_base", &self.feeds.manufacturer_base)?;

        if let Some(bad) = self.feeds.known_feeds.iter().find(|f| f.is_empty() || f.contains('/')) {
            return Err(ConfigError::Validation(format!(
                "feeds.known_feeds: invalid filename '{bad}'"
            )));
        }

        if !self.lookup.url.trim().is_empty() {
            check_http_url("lookup.url", self.lookup.url.trim())?;
        }

        if self.lookup.workers == 0 || self.lookup.workers > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "lookup.workers must be between 1 and {MAX_WORKERS}, got {}",
                self.lookup.workers
            )));
        }

        if self.lookup.in_transit_code.is_empty() || self.lookup.courtesy_code.is_empty() {
            return Err(ConfigError::Validation(
                "lookup.in_transit_code and lookup.courtesy_code must not be empty".into(),
            ));
        }

        if self.lookup.params.contains_key("vin") {
            return Err(ConfigError::Validation(
                "lookup.params must not set 'vin' (it is supplied per request)".into(),
            ));
        }

        Ok(())
    }

    /// Write a commented default config file, creating parent directories.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, DEFAULT_CONFIG).map_err(io_err)
    }
}

fn check_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must be an http(s) URL, got '{value}'")))
    }
}

pub const DEFAULT_CONFIG: &str = r#"# vinrec configuration

[feeds]
dealer_url = "https://feeds.amp.auto/feeds/coxautomotive/dealerdotcom.csv"
manufacturer_base = "https://feeds.amp.auto/feeds/vinsolutions"
known_feeds = ["garberchevroletmidland-8710.csv"]
# "All", "New" or "Used"
manufacturer_type = "All"
dealer_type = "Used"
# "abort" stops the run when a feed cannot be downloaded;
# "empty" warns and reconciles against an empty table
on_error = "abort"
timeout_secs = 30

[lookup]
enabled = true
# "get": vin + params as query string; "post": {"vin": ...} JSON body
binding = "get"
url = ""
in_transit_code = "InTransit"
courtesy_code = "EligRtlStkCT"
timeout_secs = 30
max_retries = 0
workers = 1

[lookup.params]
locale = "en_US"

[lookup.headers]
"User-Agent" = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
Accept = "application/json, text/plain, */*"

# Header values read from the environment at startup
[lookup.env_headers]

[output]
results_file = "reconciliation_results.csv"
summary_file = "issue_breakdown.csv"
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
