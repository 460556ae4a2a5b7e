//! Reviewer lookup for the pull requests of one repository.
//!
//! [`ReviewerFetcher`] starts at most one lookup per pull request and hands
//! every caller a clone of the same shared future. Failures never escape: they
//! resolve to [`ReviewerOutcome::Error`] and stay cached like successes unless
//! a [`CachePolicy`] TTL says otherwise.

mod cache;
mod normalise;

pub use cache::CachePolicy;
pub use normalise::collect_reviewers;

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::Instant;

use crate::credentials::CredentialProvider;
use crate::github::{
    FetchError, PullRequestNumber, PullRequestTarget, RepoContext, ReviewerGateway,
};

use cache::{Resolution, ReviewerCache};

/// Settled result of a reviewer lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewerOutcome {
    /// Ordered, deduplicated logins and `@team` slugs.
    Reviewers(Vec<String>),
    /// Human-readable description of what went wrong.
    Error(String),
}

/// Fetches and caches reviewer lists for one repository context.
pub struct ReviewerFetcher {
    context: RepoContext,
    gateway: Arc<dyn ReviewerGateway>,
    credentials: CredentialProvider,
    exclude_author: bool,
    cache: ReviewerCache,
}

impl ReviewerFetcher {
    /// Creates a fetcher with an empty cache.
    #[must_use]
    pub fn new(
        context: RepoContext,
        gateway: Arc<dyn ReviewerGateway>,
        credentials: CredentialProvider,
        policy: CachePolicy,
    ) -> Self {
        Self {
            context,
            gateway,
            credentials,
            exclude_author: true,
            cache: ReviewerCache::new(policy),
        }
    }

    /// Sets whether reviews by the pull request author are ignored.
    #[must_use]
    pub const fn with_author_exclusion(mut self, exclude_author: bool) -> Self {
        self.exclude_author = exclude_author;
        self
    }

    /// Repository the fetcher resolves pull requests against.
    #[must_use]
    pub const fn context(&self) -> &RepoContext {
        &self.context
    }

    /// Returns the lookup for `number`, starting it if this is the first
    /// request for that pull request (or its cached result expired).
    ///
    /// The cache entry exists as soon as this returns, so a second call made
    /// before the first result arrives shares the same network requests.
    pub fn fetch(
        &self,
        number: PullRequestNumber,
    ) -> impl Future<Output = ReviewerOutcome> + Send + 'static {
        let key = self.context.cache_key(number);
        let lookup = self.cache.get_or_start(&key, || {
            let cache_key = key.clone();
            let target = self.context.pull_request(number);
            let gateway = Arc::clone(&self.gateway);
            let credentials = self.credentials.clone();
            let exclude_author = self.exclude_author;
            async move {
                tracing::debug!(%cache_key, "fetching reviewers");
                let outcome =
                    match load_reviewers(gateway.as_ref(), &credentials, &target, exclude_author)
                        .await
                    {
                        Ok(reviewers) => ReviewerOutcome::Reviewers(reviewers),
                        Err(error) => {
                            tracing::warn!(%cache_key, "reviewer lookup failed: {error}");
                            ReviewerOutcome::Error(error.to_string())
                        }
                    };
                Resolution {
                    outcome,
                    resolved_at: Instant::now(),
                }
            }
            .boxed()
            .shared()
        });
        lookup.map(|resolution| resolution.outcome)
    }
}

async fn load_reviewers(
    gateway: &dyn ReviewerGateway,
    credentials: &CredentialProvider,
    target: &PullRequestTarget,
    exclude_author: bool,
) -> Result<Vec<String>, FetchError> {
    let headers = credentials.headers().await;
    let (detail_result, reviews_result) = futures::join!(
        gateway.pull_request(target, &headers),
        gateway.reviews(target, &headers)
    );
    let detail = detail_result?;
    let reviews = reviews_result?.unwrap_or_default();
    collect_reviewers(&detail, &reviews, exclude_author)
}
