//! Merging requested reviewers, teams, and review authors into one list.

use std::collections::HashSet;

use crate::github::{FetchError, PullRequestReviewState, SubmittedReview};

const PENDING_STATE: &str = "PENDING";

/// Builds the ordered, deduplicated reviewer list for one pull request.
///
/// Individuals come first, then `@`-prefixed teams, then users with a
/// submitted (non-pending) review. When `exclude_author` is set, reviews by
/// the pull request author are skipped.
///
/// # Errors
///
/// Returns [`FetchError::MalformedPayload`] when author exclusion is needed
/// for a review but the detail carried no author login.
pub fn collect_reviewers(
    detail: &PullRequestReviewState,
    reviews: &[SubmittedReview],
    exclude_author: bool,
) -> Result<Vec<String>, FetchError> {
    let mut review_users = Vec::new();
    for review in reviews {
        let (Some(login), Some(state)) = (review.reviewer.as_deref(), review.state.as_deref())
        else {
            continue;
        };
        if login.is_empty() || state.is_empty() || state.eq_ignore_ascii_case(PENDING_STATE) {
            continue;
        }
        if exclude_author {
            let author = detail
                .author
                .as_deref()
                .ok_or_else(|| FetchError::MalformedPayload {
                    message: "pull request detail has no author login".to_owned(),
                })?;
            if login == author {
                continue;
            }
        }
        review_users.push(login.to_owned());
    }

    let teams = detail.requested_teams.iter().map(|slug| format!("@{slug}"));
    Ok(dedupe(
        detail
            .requested_reviewers
            .iter()
            .cloned()
            .chain(teams)
            .chain(review_users),
    ))
}

fn dedupe(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
