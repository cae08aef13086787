use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::FeedbackMap;

/// Week label attached to an assignment by the course API. Sent either as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Week {
    Number(u32),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRef {
    pub name: String,
    /// Submitted URL. May carry a trailing slash the pull request URL does not have.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<Week>,
}

/// One graded submission from the course-management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub the_best: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub assignment: AssignmentRef,
}

impl AssignmentResult {
    pub fn is_best_practice(&self) -> bool {
        self.the_best.unwrap_or_default()
    }
}

/// Case-insensitive comparison with code point order as a tie-break.
///
/// Hangul syllables are laid out in dictionary order, so this matches a Korean collation for
/// the names the course API returns.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// Sorts by assignment name, then submitter name. Stable, so equal keys keep their API order.
pub fn sort_results(results: &mut [AssignmentResult]) {
    results.sort_by(|a, b| {
        locale_cmp(&a.assignment.name, &b.assignment.name).then_with(|| locale_cmp(&a.name, &b.name))
    });
}

/// Correction hook applied to fetched results before they are persisted. Currently a no-op.
pub fn adjust_results(results: Vec<AssignmentResult>) -> Vec<AssignmentResult> {
    results
}

/// Feedback keyed by submitted URL. Results without a URL or with empty feedback are skipped;
/// a later result for the same URL replaces an earlier one.
pub fn collect_feedbacks(results: &[AssignmentResult]) -> FeedbackMap {
    results
        .iter()
        .filter(|result| !result.assignment.url.is_empty())
        .filter_map(|result| {
            result
                .feedback
                .as_ref()
                .filter(|feedback| !feedback.is_empty())
                .map(|feedback| (result.assignment.url.clone(), feedback.clone()))
        })
        .collect()
}
