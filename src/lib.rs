//! Reviewer annotations for GitHub pull request list views.
//!
//! The library watches a list view document, finds pull request rows, and
//! decorates each one with the people asked to review it and those who
//! already did. Lookups go through Octocrab, are shared per session, and are
//! rendered back into the row once they resolve.
//!
//! [`navigation::Extension`] ties the pieces together for one page and keeps
//! them in step with in-page navigation.

pub mod annotate;
pub mod config;
pub mod credentials;
pub mod error;
pub mod github;
pub mod navigation;
pub mod page;
pub mod reviewers;
pub mod settings;

pub use annotate::{AnnotatorOptions, RowAnnotator};
pub use config::{ConfigError, ReviewLensConfig};
pub use credentials::CredentialProvider;
pub use error::AppError;
pub use github::{FetchError, OctocrabReviewerGateway, RepoContext, ReviewerGateway};
pub use navigation::{Extension, ExtensionHandle, InitOutcome, MonitorTiming};
pub use page::Page;
pub use reviewers::{CachePolicy, ReviewerFetcher, ReviewerOutcome};
pub use settings::{JsonFileSettingsStore, SettingsError, SettingsStore};
