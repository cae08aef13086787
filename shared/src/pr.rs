use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GithubHandle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestAuthor {
    pub id: u64,
    pub login: GithubHandle,
    pub avatar_url: String,
    pub html_url: String,
}

/// Snapshot of a pull request as stored in `repos/<name>/pulls.json`.
///
/// Field names follow the hosting API so snapshots written by earlier tooling still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    #[serde(default)]
    pub number: u64,
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub user: PullRequestAuthor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub type PullRequestIndex = HashMap<String, PullRequest>;

/// Keys pull requests by `html_url`. A later pull request with the same URL replaces an earlier one.
pub fn index_pull_requests(pulls: impl IntoIterator<Item = PullRequest>) -> PullRequestIndex {
    pulls
        .into_iter()
        .map(|pr| (pr.html_url.clone(), pr))
        .collect()
}

/// URLs to try, in order, when looking up a submitted URL.
///
/// The raw URL first, then the same URL without its trailing slash. An empty URL yields nothing.
pub fn lookup_candidates(url: &str) -> impl Iterator<Item = &str> {
    let stripped = url.strip_suffix('/').filter(|s| !s.is_empty());
    Some(url)
        .filter(|u| !u.is_empty())
        .into_iter()
        .chain(stripped)
}

/// `org/repo` part of a pull request URL such as `https://github.com/org/repo/pull/5`.
pub fn repository_from_url(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("github.com/")?;
    let (repository, _) = rest.split_once("/pull")?;
    (!repository.is_empty()).then_some(repository)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    pub id: u64,
    pub user: GithubHandle,
    pub title: String,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

impl From<&PullRequest> for AssignmentDetail {
    fn from(pr: &PullRequest) -> Self {
        Self {
            id: pr.id,
            user: pr.user.login.clone(),
            title: pr.title.clone(),
            body: pr.body.clone(),
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            url: pr.html_url.clone(),
        }
    }
}

pub type AssignmentDetails = BTreeMap<String, AssignmentDetail>;

pub fn assignment_details(index: &PullRequestIndex) -> AssignmentDetails {
    index
        .iter()
        .map(|(url, pr)| (url.clone(), AssignmentDetail::from(pr)))
        .collect()
}

/// Finds the detail for a submitted URL, tolerating a trailing slash.
pub fn find_detail<'a>(details: &'a AssignmentDetails, url: &str) -> Option<&'a AssignmentDetail> {
    lookup_candidates(url).find_map(|candidate| details.get(candidate))
}
