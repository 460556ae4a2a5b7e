//! Knobs shared by every annotation session.

use url::Url;

use crate::page::{AttributeTest, Selector};
use crate::page::list_view::{INDICATOR_CLASS, META_CLASSES, PERMALINK_CLASS, ROW_CLASS};
use crate::reviewers::CachePolicy;

/// Public GitHub web origin.
pub const DEFAULT_WEB_BASE: &str = "https://github.com";

/// Classes of the inline container holding the indicator.
const INLINE_CLASSES: [&str; 2] = ["d-none", "d-md-inline-flex"];
/// Extra classes carried by a freshly created indicator.
const INDICATOR_EXTRA_CLASSES: [&str; 2] = ["issue-meta-section", "ml-2"];

/// Selectors locating rows and the indicator anchor inside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// One pull request row.
    pub row: Selector,
    /// Metadata line the indicator hangs off.
    pub meta_container: Selector,
    /// Inline container inside the metadata line; created when absent.
    pub inline_container: Selector,
    /// The indicator itself; created when absent.
    pub indicator: Selector,
    /// Title link used when the row has no usable `id`.
    pub permalink: Selector,
}

impl Default for Selectors {
    fn default() -> Self {
        let mut indicator_classes = vec![INDICATOR_CLASS];
        indicator_classes.extend(INDICATOR_EXTRA_CLASSES);
        Self {
            row: Selector::with_classes(&[ROW_CLASS]),
            meta_container: Selector::with_classes(&META_CLASSES),
            inline_container: Selector::with_classes(&INLINE_CLASSES).tag("span"),
            indicator: Selector::with_classes(&indicator_classes).tag("span"),
            permalink: Selector::with_classes(&[PERMALINK_CLASS])
                .tag("a")
                .attribute(AttributeTest::Contains("href".to_owned(), "/pull/".to_owned())),
        }
    }
}

/// Behaviour switches for the annotation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorOptions {
    /// Skip reviews written by the pull request author.
    pub exclude_author: bool,
    /// Render each reviewer as a link to a filtered list view.
    pub link_reviewers: bool,
    /// Remove existing indicators when a new session starts.
    pub clear_indicators_on_navigation: bool,
    /// Web origin used for the qualifying host and reviewer links.
    pub web_base: Url,
    /// Row and anchor selectors.
    pub selectors: Selectors,
    /// Lifetime of cached lookups.
    pub cache_policy: CachePolicy,
}

impl Default for AnnotatorOptions {
    fn default() -> Self {
        Self {
            exclude_author: true,
            link_reviewers: true,
            clear_indicators_on_navigation: false,
            web_base: default_web_base(),
            selectors: Selectors::default(),
            cache_policy: CachePolicy::session(),
        }
    }
}

impl AnnotatorOptions {
    /// Host a location must be on to qualify.
    #[must_use]
    pub fn host(&self) -> &str {
        self.web_base.host_str().unwrap_or_default()
    }
}

#[expect(
    clippy::expect_used,
    reason = "the default origin is a valid URL literal"
)]
fn default_web_base() -> Url {
    Url::parse(DEFAULT_WEB_BASE).expect("default web base should parse")
}
