//! Data models for the pull request detail and review listing endpoints.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into the public domain types used by the reviewer logic.

use serde::Deserialize;

/// Reviewer-related fields of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestReviewState {
    /// Logins of individually requested reviewers, in API order.
    pub requested_reviewers: Vec<String>,
    /// Slugs of requested teams, in API order, without the `@` prefix.
    pub requested_teams: Vec<String>,
    /// Login of the pull request author if present.
    pub author: Option<String>,
}

/// One submitted (or pending) review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedReview {
    /// Login of the reviewing user if GitHub still knows the account.
    pub reviewer: Option<String>,
    /// Review state such as `APPROVED` or `PENDING`.
    pub state: Option<String>,
}

impl SubmittedReview {
    /// Builds a review from a login and state.
    #[must_use]
    pub fn new(reviewer: &str, state: &str) -> Self {
        Self {
            reviewer: Some(reviewer.to_owned()),
            state: Some(state.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequestDetail {
    #[serde(default)]
    pub(super) requested_reviewers: Option<Vec<Option<ApiUser>>>,
    #[serde(default)]
    pub(super) requested_teams: Option<Vec<Option<ApiTeam>>>,
    #[serde(default)]
    pub(super) user: Option<ApiUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    #[serde(default)]
    pub(super) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiTeam {
    #[serde(default)]
    pub(super) slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiReview {
    #[serde(default)]
    pub(super) user: Option<ApiUser>,
    #[serde(default)]
    pub(super) state: Option<String>,
}

impl From<ApiPullRequestDetail> for PullRequestReviewState {
    fn from(value: ApiPullRequestDetail) -> Self {
        Self {
            requested_reviewers: value
                .requested_reviewers
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .filter_map(|user| user.login)
                .collect(),
            requested_teams: value
                .requested_teams
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .filter_map(|team| team.slug)
                .collect(),
            author: value.user.and_then(|user| user.login),
        }
    }
}

impl From<ApiReview> for SubmittedReview {
    fn from(value: ApiReview) -> Self {
        Self {
            reviewer: value.user.and_then(|user| user.login),
            state: value.state,
        }
    }
}

/// Decodes a reviews listing body.
///
/// A body that is valid JSON but not an array yields no reviews, and `null`
/// entries are skipped.
pub(super) fn decode_reviews(body: &str) -> Result<Vec<SubmittedReview>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let serde_json::Value::Array(entries) = value else {
        return Ok(Vec::new());
    };

    let reviews = entries
        .into_iter()
        .filter(|entry| !entry.is_null())
        .map(serde_json::from_value::<ApiReview>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reviews.into_iter().map(SubmittedReview::from).collect())
}
