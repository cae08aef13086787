//! Joins course results to pull requests and GitHub profiles, one user record per login.

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    lookup_candidates, AssignmentResult, GithubHandle, GithubIdentity, ProfileIndex, PullRequest,
    PullRequestIndex, UserAssignment, UserMap, UserRecord,
};

const SAMPLE_KEYS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The course API returned no submitted URL.
    MissingUrl,
    /// No pull request is indexed under the URL, with or without its trailing slash.
    UnknownPullRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedResult {
    pub submitter: String,
    pub assignment: String,
    pub url: String,
    pub reason: DropReason,
}

/// A result ignored because the user already has an entry for the same assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateResult {
    pub login: GithubHandle,
    pub assignment: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub users: UserMap,
    pub dropped: Vec<DroppedResult>,
    pub duplicates: Vec<DuplicateResult>,
    pub kept: usize,
}

pub struct Reconciler<'a> {
    pulls: &'a PullRequestIndex,
    profiles: &'a ProfileIndex,
    sample_keys: Vec<&'a str>,
}

impl<'a> Reconciler<'a> {
    pub fn new(pulls: &'a PullRequestIndex, profiles: &'a ProfileIndex) -> Self {
        let sample_keys = pulls
            .keys()
            .map(String::as_str)
            .sorted()
            .take(SAMPLE_KEYS)
            .collect();
        Self {
            pulls,
            profiles,
            sample_keys,
        }
    }

    /// Exact `html_url` match first, then the URL without its trailing slash.
    pub fn resolve(&self, url: &str) -> Option<&'a PullRequest> {
        lookup_candidates(url).find_map(|candidate| self.pulls.get(candidate))
    }

    /// Folds `results` in order. The first result for a (user, assignment) pair wins.
    pub fn reconcile(&self, results: &[AssignmentResult]) -> Reconciliation {
        let reconciliation = results
            .iter()
            .fold(Reconciliation::default(), |acc, result| self.fold(acc, result));

        info!(
            users = reconciliation.users.len(),
            kept = reconciliation.kept,
            dropped = reconciliation.dropped.len(),
            duplicates = reconciliation.duplicates.len(),
            "Reconciled assignment results"
        );
        reconciliation
    }

    fn fold(&self, mut acc: Reconciliation, result: &AssignmentResult) -> Reconciliation {
        let url = &result.assignment.url;
        let Some(pull) = self.resolve(url) else {
            let reason = if url.is_empty() {
                DropReason::MissingUrl
            } else {
                DropReason::UnknownPullRequest
            };
            warn!(
                submitter = %result.name,
                assignment = %result.assignment.name,
                url = %url,
                ?reason,
                known_keys = ?self.sample_keys,
                "Dropping assignment result without a matching pull request"
            );
            acc.dropped.push(DroppedResult {
                submitter: result.name.clone(),
                assignment: result.assignment.name.clone(),
                url: url.clone(),
                reason,
            });
            return acc;
        };

        let login = &pull.user.login;
        let user = acc.users.entry(login.clone()).or_insert_with(|| {
            let identity =
                GithubIdentity::resolve(self.profiles.get(login), &pull.user, &result.name);
            UserRecord::new(result.name.clone(), identity)
        });

        if user
            .assignments
            .iter()
            .any(|existing| self.same_submission(existing, result, pull))
        {
            debug!(
                login = %login,
                assignment = %result.assignment.name,
                url = %url,
                "Ignoring duplicate assignment result"
            );
            acc.duplicates.push(DuplicateResult {
                login: login.clone(),
                assignment: result.assignment.name.clone(),
                url: url.clone(),
            });
            return acc;
        }

        user.assignments.push(UserAssignment::from(result));
        acc.kept += 1;
        acc
    }

    fn same_submission(
        &self,
        existing: &UserAssignment,
        result: &AssignmentResult,
        pull: &PullRequest,
    ) -> bool {
        existing.assignment_name == result.assignment.name
            || self
                .resolve(&existing.url)
                .is_some_and(|known| known.html_url == pull.html_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assignment::tests::result, index_profiles, index_pull_requests, pr::tests::pull_request,
        GithubProfile,
    };

    const PR5: &str = "https://github.com/org/repo/pull/5";

    fn index() -> PullRequestIndex {
        index_pull_requests([
            pull_request(42, "alice", PR5),
            pull_request(43, "bob", "https://github.com/org/repo/pull/6"),
            pull_request(44, "alice", "https://github.com/org/other/pull/1"),
        ])
    }

    #[test]
    fn trailing_slash_resolves_to_indexed_pull_request() {
        let pulls = index();
        let profiles = ProfileIndex::new();
        let reconciler = Reconciler::new(&pulls, &profiles);

        let with_slash = reconciler.reconcile(&[result("Alice", "A1", &format!("{PR5}/"), true)]);
        let without_slash = reconciler.reconcile(&[result("Alice", "A1", PR5, true)]);

        let alice = &with_slash.users["alice"];
        assert_eq!(alice.assignments.len(), 1);
        assert_eq!(alice.assignments[0].url, format!("{PR5}/"));
        assert_eq!(alice.assignments[0].assignment_name, "A1");
        assert!(alice.assignments[0].passed);
        assert_eq!(
            with_slash.users["alice"].github,
            without_slash.users["alice"].github
        );
    }

    #[test]
    fn later_duplicate_does_not_overwrite_first_match() {
        let pulls = index();
        let profiles = ProfileIndex::new();
        let reconciler = Reconciler::new(&pulls, &profiles);

        let outcome = reconciler.reconcile(&[
            result("Alice", "A1", &format!("{PR5}/"), true),
            result("Alice", "A1", &format!("{PR5}/"), false),
            result("Alice", "A1 (resubmitted)", PR5, false),
        ]);

        let alice = &outcome.users["alice"];
        assert_eq!(alice.assignments.len(), 1);
        assert!(alice.assignments[0].passed);
        assert_eq!(outcome.kept, 1);
        assert_eq!(outcome.duplicates.len(), 2);
        assert_eq!(outcome.duplicates[0].login, "alice");
    }

    #[test]
    fn same_assignment_name_counts_once_per_user() {
        let pulls = index();
        let profiles = ProfileIndex::new();
        let reconciler = Reconciler::new(&pulls, &profiles);

        let outcome = reconciler.reconcile(&[
            result("Alice", "A1", PR5, false),
            result("Alice", "A1", "https://github.com/org/other/pull/1", true),
        ]);

        let alice = &outcome.users["alice"];
        assert_eq!(alice.assignments.len(), 1);
        assert!(!alice.assignments[0].passed);
        assert_eq!(alice.assignments[0].url, PR5);
        assert_eq!(outcome.duplicates.len(), 1);
    }

    #[test]
    fn unmatched_results_are_dropped_and_reported() {
        let pulls = index();
        let profiles = ProfileIndex::new();
        let reconciler = Reconciler::new(&pulls, &profiles);

        let outcome = reconciler.reconcile(&[
            result("Carol", "A1", "https://github.com/org/repo/pull/99", true),
            result("Dan", "A1", "", true),
            result("Bob", "A1", "https://github.com/org/repo/pull/6", true),
        ]);

        assert_eq!(outcome.users.len(), 1);
        assert!(outcome.users.contains_key("bob"));
        assert_eq!(
            outcome.dropped,
            vec![
                DroppedResult {
                    submitter: "Carol".to_string(),
                    assignment: "A1".to_string(),
                    url: "https://github.com/org/repo/pull/99".to_string(),
                    reason: DropReason::UnknownPullRequest,
                },
                DroppedResult {
                    submitter: "Dan".to_string(),
                    assignment: "A1".to_string(),
                    url: String::new(),
                    reason: DropReason::MissingUrl,
                },
            ]
        );
    }

    #[test]
    fn user_without_profile_gets_author_identity() {
        let pulls = index();
        let profiles = ProfileIndex::new();
        let reconciler = Reconciler::new(&pulls, &profiles);

        let outcome = reconciler.reconcile(&[result(
            "Bob",
            "A1",
            "https://github.com/org/repo/pull/6",
            true,
        )]);
        let bob = &outcome.users["bob"];
        let author = &pulls["https://github.com/org/repo/pull/6"].user;

        assert_eq!(bob.name, "Bob");
        assert_eq!(bob.github.login, author.login);
        assert_eq!(bob.github.id, author.id.to_string());
        assert_eq!(bob.github.avatar_url, author.avatar_url);
        assert_eq!(bob.github.html_url, author.html_url);
        assert_eq!(bob.github.followers, 0);
        assert_eq!(bob.github.following, 0);
    }

    #[test]
    fn profile_enriches_identity() {
        let pulls = index();
        let profiles = index_profiles([GithubProfile {
            login: "alice".to_string(),
            name: Some("Alice Kim".to_string()),
            followers: Some(10),
            ..Default::default()
        }]);
        let reconciler = Reconciler::new(&pulls, &profiles);

        let outcome = reconciler.reconcile(&[result("Alice", "A1", PR5, true)]);

        assert_eq!(outcome.users["alice"].name, "Alice");
        assert_eq!(outcome.users["alice"].github.name, "Alice Kim");
        assert_eq!(outcome.users["alice"].github.followers, 10);
    }

    #[test]
    fn reconciling_twice_is_identical() {
        let pulls = index();
        let profiles = ProfileIndex::new();
        let reconciler = Reconciler::new(&pulls, &profiles);
        let results = vec![
            result("Bob", "A1", "https://github.com/org/repo/pull/6", true),
            result("Alice", "A1", PR5, true),
            result("Alice", "A2", "https://github.com/org/other/pull/1", false),
            result("Carol", "A1", "https://github.com/org/repo/pull/99", true),
        ];

        let first = serde_json::to_string(&reconciler.reconcile(&results).users).unwrap();
        let second = serde_json::to_string(&reconciler.reconcile(&results).users).unwrap();

        assert_eq!(first, second);
    }
}
