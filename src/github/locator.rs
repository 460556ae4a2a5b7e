//! Repository coordinates and pull request identities derived from pages.

use std::fmt;
use std::str::FromStr;

use url::Url;

use super::error::LocationError;

/// Path segment that marks a pull request list view.
const PULLS_SEGMENT: &str = "pulls";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Wraps a non-empty owner login.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::MissingPathSegments`] when `value` is empty.
    pub fn new(value: &str) -> Result<Self, LocationError> {
        if value.is_empty() {
            return Err(LocationError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Wraps a non-empty repository name.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::MissingPathSegments`] when `value` is empty.
    pub fn new(value: &str) -> Result<Self, LocationError> {
        if value.is_empty() {
            return Err(LocationError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Wraps a positive pull request number.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidPullRequestNumber`] for zero.
    pub fn new(value: u64) -> Result<Self, LocationError> {
        if value == 0 {
            return Err(LocationError::InvalidPullRequestNumber {
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for PullRequestNumber {
    type Err = LocationError;

    /// Parses a run of ASCII digits. Signs and whitespace are rejected.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || LocationError::InvalidPullRequestNumber {
            value: value.to_owned(),
        };
        if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }
        value
            .parse::<u64>()
            .map_err(|_| invalid())
            .and_then(Self::new)
    }
}

impl fmt::Display for PullRequestNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Owner and repository of the list view currently shown.
///
/// A context is derived once per navigation and never mutated; the reviewer
/// cache built for it lives exactly as long as it does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoContext {
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepoContext {
    /// Builds a context from already validated parts.
    #[must_use]
    pub const fn new(owner: RepositoryOwner, repository: RepositoryName) -> Self {
        Self { owner, repository }
    }

    /// Derives the context from a page path such as `/octo/repo/pulls?q=...`.
    ///
    /// The third segment only needs to start with `pulls`, matching the list
    /// view and its filtered variants.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::NotAListView`] when the path does not have the
    /// `/owner/repo/pulls` shape.
    pub fn from_path(path: &str) -> Result<Self, LocationError> {
        let not_a_list = || LocationError::NotAListView {
            location: path.to_owned(),
        };
        let trimmed = path.strip_prefix('/').ok_or_else(not_a_list)?;
        let mut segments = trimmed.splitn(3, '/');
        let owner_segment = segments.next().ok_or_else(not_a_list)?;
        let repository_segment = segments.next().ok_or_else(not_a_list)?;
        let rest = segments.next().ok_or_else(not_a_list)?;

        if !rest.starts_with(PULLS_SEGMENT) {
            return Err(not_a_list());
        }

        let owner = RepositoryOwner::new(owner_segment).map_err(|_| not_a_list())?;
        let repository = RepositoryName::new(repository_segment).map_err(|_| not_a_list())?;
        Ok(Self::new(owner, repository))
    }

    /// Derives the context from a full page location.
    ///
    /// Locations on a host other than `expected_host` never qualify.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidUrl`] when `location` does not parse and
    /// [`LocationError::NotAListView`] when the host or path do not qualify.
    pub fn from_location(location: &str, expected_host: &str) -> Result<Self, LocationError> {
        let parsed =
            Url::parse(location).map_err(|error| LocationError::InvalidUrl(error.to_string()))?;

        let host_matches = parsed
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(expected_host));
        if !host_matches {
            return Err(LocationError::NotAListView {
                location: location.to_owned(),
            });
        }

        Self::from_path(parsed.path()).map_err(|_| LocationError::NotAListView {
            location: location.to_owned(),
        })
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Cache key scoping a pull request to this repository: `owner/repo#n`.
    #[must_use]
    pub fn cache_key(&self, number: PullRequestNumber) -> String {
        format!(
            "{}/{}#{}",
            self.owner.as_str(),
            self.repository.as_str(),
            number.get()
        )
    }

    /// Targets one pull request in this repository.
    #[must_use]
    pub fn pull_request(&self, number: PullRequestNumber) -> PullRequestTarget {
        PullRequestTarget {
            context: self.clone(),
            number,
        }
    }
}

/// A single pull request inside a [`RepoContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestTarget {
    context: RepoContext,
    number: PullRequestNumber,
}

impl PullRequestTarget {
    /// Repository the pull request belongs to.
    #[must_use]
    pub const fn context(&self) -> &RepoContext {
        &self.context
    }

    /// Pull request number.
    #[must_use]
    pub const fn number(&self) -> PullRequestNumber {
        self.number
    }

    pub(crate) fn pull_request_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls/{}",
            self.context.owner.as_str(),
            self.context.repository.as_str(),
            self.number.get()
        )
    }

    pub(crate) fn reviews_path(&self) -> String {
        format!("{}/reviews", self.pull_request_path())
    }
}
