//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.reviewlens.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `REVIEWLENS_PAGE_URL`,
//!    `REVIEWLENS_API_BASE`, and friends
//! 4. **Command-line arguments** – `--page-url`/`-u`, `--pr-numbers`/`-p`, ...
//!
//! # Configuration File
//!
//! Place `.reviewlens.toml` in the current directory, home directory, or
//! XDG config directory with:
//!
//! ```toml
//! page_url = "https://github.com/octocat/hello-world/pulls"
//! pr_numbers = "12,15"
//! api_base = "https://api.github.com"
//! cache_ttl_seconds = 300
//! clear_indicators = true
//! watch = true
//! poll_interval_ms = 1000
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::annotate::{AnnotatorOptions, DEFAULT_WEB_BASE, Selectors};
use crate::github::{LocationError, PullRequestNumber};
use crate::navigation::MonitorTiming;
use crate::page::{Selector, SelectorError};
use crate::page::list_view::ROW_CLASS;
use crate::reviewers::CachePolicy;
use crate::settings::{self, InstallReason};

/// Public GitHub REST API origin.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// File name of the token settings inside the configuration directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

const APP_DIR_NAME: &str = "reviewlens";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Errors raised while turning configuration values into runtime options.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `web_base` is not an absolute URL with a host.
    #[error("invalid web base URL: {0}")]
    InvalidWebBase(String),

    /// `row_selector` is not a supported compound selector.
    #[error("invalid row selector: {0}")]
    InvalidRowSelector(#[from] SelectorError),

    /// An entry of `pr_numbers` is not a positive integer.
    #[error("invalid pull request numbers: {0}")]
    InvalidPullRequestNumbers(#[from] LocationError),

    /// A list view run was requested without a page URL.
    #[error("a list view URL is required (use --page-url or -u)")]
    MissingPageUrl,

    /// `poll_interval_ms` is zero.
    #[error("poll interval must be at least one millisecond")]
    ZeroPollInterval,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `REVIEWLENS_PAGE_URL` or `--page-url`: List view to annotate
/// - `REVIEWLENS_PR_NUMBERS` or `--pr-numbers`: Rows to place on the page
/// - `REVIEWLENS_SETTINGS_PATH` or `--settings-path`: Token settings file
/// - `REVIEWLENS_API_BASE` or `--api-base`: REST API origin
/// - `REVIEWLENS_WEB_BASE` or `--web-base`: Web origin pages must live on
///
/// # Example
///
/// ```no_run
/// use reviewlens::ReviewLensConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = ReviewLensConfig::load().expect("failed to load configuration");
/// let options = config.annotator_options().expect("options should be valid");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REVIEWLENS",
    discovery(
        dotfile_name = ".reviewlens.toml",
        config_file_name = "reviewlens.toml",
        app_name = "reviewlens"
    )
)]
pub struct ReviewLensConfig {
    /// Location of the pull request list view to annotate.
    ///
    /// Can be provided via:
    /// - CLI: `--page-url <URL>` or `-u <URL>`
    /// - Environment: `REVIEWLENS_PAGE_URL`
    /// - Config file: `page_url = "..."`
    #[ortho_config(cli_short = 'u')]
    pub page_url: Option<String>,

    /// Comma separated pull request numbers rendered as rows.
    ///
    /// Can be provided via:
    /// - CLI: `--pr-numbers <LIST>` or `-p <LIST>`
    /// - Environment: `REVIEWLENS_PR_NUMBERS`
    /// - Config file: `pr_numbers = "12,15"`
    #[ortho_config(cli_short = 'p')]
    pub pr_numbers: Option<String>,

    /// Path of the JSON file holding the access token.
    ///
    /// Defaults to `reviewlens/settings.json` below `XDG_CONFIG_HOME`, or
    /// below `~/.config` when that is unset.
    ///
    /// Can be provided via:
    /// - CLI: `--settings-path <PATH>`
    /// - Environment: `REVIEWLENS_SETTINGS_PATH`
    /// - Config file: `settings_path = "..."`
    #[ortho_config(cli_short = 'S')]
    pub settings_path: Option<String>,

    /// Validates and stores a personal access token, then exits.
    ///
    /// Can be provided via:
    /// - CLI: `--save-token <TOKEN>` or `-s <TOKEN>`
    /// - Environment: `REVIEWLENS_SAVE_TOKEN`
    #[ortho_config(cli_short = 's')]
    pub save_token: Option<String>,

    /// Prints the masked stored token, then exits.
    ///
    /// Can be provided via:
    /// - CLI: `--show-token`
    /// - Config file: `show_token = true`
    ///
    /// Note: Environment variable `REVIEWLENS_SHOW_TOKEN` is not supported
    /// because `ortho_config` does not load boolean values from the environment.
    #[ortho_config()]
    pub show_token: bool,

    /// REST API origin used for reviewer lookups.
    ///
    /// Can be provided via:
    /// - CLI: `--api-base <URL>`
    /// - Environment: `REVIEWLENS_API_BASE`
    /// - Config file: `api_base = "..."`
    #[ortho_config()]
    pub api_base: String,

    /// Web origin that list views must be served from. Reviewer links point
    /// here too.
    ///
    /// Can be provided via:
    /// - CLI: `--web-base <URL>`
    /// - Environment: `REVIEWLENS_WEB_BASE`
    /// - Config file: `web_base = "..."`
    #[ortho_config()]
    pub web_base: String,

    /// Keeps reviews submitted by the pull request author.
    ///
    /// Can be provided via:
    /// - CLI: `--include-author-reviews`
    /// - Config file: `include_author_reviews = true`
    #[ortho_config()]
    pub include_author_reviews: bool,

    /// Renders reviewer names as plain text instead of search links.
    ///
    /// Can be provided via:
    /// - CLI: `--plain-reviewers`
    /// - Config file: `plain_reviewers = true`
    #[ortho_config()]
    pub plain_reviewers: bool,

    /// Removes indicators left by a previous session when navigating.
    ///
    /// Can be provided via:
    /// - CLI: `--clear-indicators`
    /// - Config file: `clear_indicators = true`
    #[ortho_config()]
    pub clear_indicators: bool,

    /// Lifetime of cached reviewer lookups, in seconds. `0` keeps them for
    /// the whole session.
    ///
    /// Can be provided via:
    /// - CLI: `--cache-ttl-seconds <SECONDS>`
    /// - Environment: `REVIEWLENS_CACHE_TTL_SECONDS`
    /// - Config file: `cache_ttl_seconds = 300`
    #[ortho_config()]
    pub cache_ttl_seconds: u64,

    /// Keeps running after the first pass and re-annotates the rows each
    /// time a location read from standard input is navigated to.
    ///
    /// Can be provided via:
    /// - CLI: `--watch`
    /// - Config file: `watch = true`
    ///
    /// Note: Environment variable `REVIEWLENS_WATCH` is not supported
    /// because `ortho_config` does not load boolean values from the environment.
    #[ortho_config()]
    pub watch: bool,

    /// Period of the location poll in watch mode, in milliseconds. Must be
    /// positive; defaults to one second.
    ///
    /// Can be provided via:
    /// - CLI: `--poll-interval-ms <MS>`
    /// - Environment: `REVIEWLENS_POLL_INTERVAL_MS`
    /// - Config file: `poll_interval_ms = 1000`
    #[ortho_config()]
    pub poll_interval_ms: u64,

    /// Delay between noticing a navigation and re-initialising in watch
    /// mode, in milliseconds. Defaults to half a second.
    ///
    /// Can be provided via:
    /// - CLI: `--settle-delay-ms <MS>`
    /// - Environment: `REVIEWLENS_SETTLE_DELAY_MS`
    /// - Config file: `settle_delay_ms = 500`
    #[ortho_config()]
    pub settle_delay_ms: u64,

    /// Selector matching pull request rows.
    ///
    /// Can be provided via:
    /// - CLI: `--row-selector <SELECTOR>`
    /// - Environment: `REVIEWLENS_ROW_SELECTOR`
    /// - Config file: `row_selector = ".js-issue-row"`
    #[ortho_config()]
    pub row_selector: String,
}

impl Default for ReviewLensConfig {
    fn default() -> Self {
        Self {
            page_url: None,
            pr_numbers: None,
            settings_path: None,
            save_token: None,
            show_token: false,
            api_base: DEFAULT_API_BASE.to_owned(),
            web_base: DEFAULT_WEB_BASE.to_owned(),
            include_author_reviews: false,
            plain_reviewers: false,
            clear_indicators: false,
            cache_ttl_seconds: 0,
            watch: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            row_selector: format!(".{ROW_CLASS}"),
        }
    }
}

impl ReviewLensConfig {
    /// Builds the annotation options described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWebBase`] when `web_base` is not an
    /// absolute URL with a host, or [`ConfigError::InvalidRowSelector`] when
    /// `row_selector` cannot be parsed.
    pub fn annotator_options(&self) -> Result<AnnotatorOptions, ConfigError> {
        let web_base = Url::parse(&self.web_base)
            .map_err(|error| ConfigError::InvalidWebBase(format!("{}: {error}", self.web_base)))?;
        if web_base.host_str().is_none() {
            return Err(ConfigError::InvalidWebBase(self.web_base.clone()));
        }
        let row = Selector::parse(&self.row_selector)?;

        Ok(AnnotatorOptions {
            exclude_author: !self.include_author_reviews,
            link_reviewers: !self.plain_reviewers,
            clear_indicators_on_navigation: self.clear_indicators,
            web_base,
            selectors: Selectors {
                row,
                ..Selectors::default()
            },
            cache_policy: self.cache_policy(),
        })
    }

    /// Cache lifetime for reviewer lookups.
    #[must_use]
    pub const fn cache_policy(&self) -> CachePolicy {
        if self.cache_ttl_seconds == 0 {
            CachePolicy::session()
        } else {
            CachePolicy::expiring_after(Duration::from_secs(self.cache_ttl_seconds))
        }
    }

    /// Poll and settle timing for navigation monitoring.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroPollInterval`] when `poll_interval_ms` is
    /// zero.
    pub const fn monitor_timing(&self) -> Result<MonitorTiming, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(MonitorTiming {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        })
    }

    /// Whether to point the user at `--save-token` before running.
    ///
    /// Only a first run that is not already saving a token gets the hint.
    #[must_use]
    pub const fn wants_token_hint(&self, reason: InstallReason) -> bool {
        self.save_token.is_none() && settings::should_open_settings(reason)
    }

    /// Returns the page URL or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPageUrl`] when no URL is configured.
    pub fn require_page_url(&self) -> Result<&str, ConfigError> {
        self.page_url.as_deref().ok_or(ConfigError::MissingPageUrl)
    }

    /// Resolves where token settings live.
    ///
    /// An explicit `settings_path` wins. Otherwise the file sits in a
    /// `reviewlens` directory under `XDG_CONFIG_HOME`, then `~/.config`,
    /// then the working directory.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        if let Some(path) = self.settings_path.as_deref() {
            return PathBuf::from(path);
        }
        let config_home = env::var_os("XDG_CONFIG_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                env::var_os("HOME")
                    .filter(|value| !value.is_empty())
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .unwrap_or_default();
        config_home.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME)
    }

    /// Parses `pr_numbers` into validated pull request numbers.
    ///
    /// Blank entries are ignored, so `"1,,2,"` yields two numbers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPullRequestNumbers`] when an entry is
    /// not a positive integer.
    pub fn parse_pr_numbers(&self) -> Result<Vec<PullRequestNumber>, ConfigError> {
        let Some(raw) = self.pr_numbers.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.parse::<PullRequestNumber>().map_err(ConfigError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests;
