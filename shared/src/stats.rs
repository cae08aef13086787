//! Per-assignment submission statistics for the assignments index page.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    find_detail, locale_cmp, ranking::round1, repository_from_url, AssignmentDetails, GithubHandle,
    UserMap,
};

/// Display metadata for one repository, keyed by `org/repo` in the pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentInfo {
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

pub type AssignmentCatalog = BTreeMap<String, AssignmentInfo>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPracticeUser {
    pub assignment_id: u64,
    pub user_id: GithubHandle,
    pub user_name: String,
    pub pr_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    pub id: String,
    pub title: String,
    pub chapter: String,
    pub repository: String,
    pub url: String,
    pub total_submissions: usize,
    pub passed_count: usize,
    pub best_practice_count: usize,
    /// Percentage, one decimal.
    pub pass_rate: f64,
    pub best_practice_users: Vec<BestPracticeUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub total_assignments: usize,
    pub total_submissions: usize,
    pub total_best_practices: usize,
    pub average_pass_rate: f64,
}

struct Submission {
    id: u64,
    passed: bool,
    best: bool,
    user_id: GithubHandle,
    user_name: String,
    pr_url: String,
}

/// Groups every user's submissions by repository.
///
/// Each user counts once per repository. Submissions whose URL has no assignment detail are
/// left out because they cannot be linked to a page.
pub fn summarize(
    users: &UserMap,
    details: &AssignmentDetails,
    catalog: &AssignmentCatalog,
) -> Vec<AssignmentSummary> {
    let mut per_repository: BTreeMap<&str, Vec<Submission>> = BTreeMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for (login, user) in users {
        for assignment in &user.assignments {
            let Some(repository) = repository_from_url(&assignment.url) else {
                continue;
            };
            let Some(detail) = find_detail(details, &assignment.url) else {
                continue;
            };
            if !seen.insert((repository, login.as_str())) {
                continue;
            }

            per_repository
                .entry(repository)
                .or_default()
                .push(Submission {
                    id: detail.id,
                    passed: assignment.passed,
                    best: assignment.is_best_practice(),
                    user_id: login.clone(),
                    user_name: user.name.clone(),
                    pr_url: assignment.url.clone(),
                });
        }
    }

    let mut summaries: Vec<_> = per_repository
        .into_iter()
        .map(|(repository, submissions)| summary(repository, submissions, catalog))
        .collect();

    summaries.sort_by(|a, b| {
        chapter_number(&a.chapter)
            .cmp(&chapter_number(&b.chapter))
            .then_with(|| locale_cmp(&a.title, &b.title))
    });
    summaries
}

fn summary(
    repository: &str,
    submissions: Vec<Submission>,
    catalog: &AssignmentCatalog,
) -> AssignmentSummary {
    let info = catalog.get(repository).cloned().unwrap_or_default();
    let total_submissions = submissions.len();
    let passed_count = submissions.iter().filter(|s| s.passed).count();
    let best_practice_users: Vec<_> = submissions
        .into_iter()
        .filter(|s| s.best)
        .map(|s| BestPracticeUser {
            assignment_id: s.id,
            user_id: s.user_id,
            user_name: s.user_name,
            pr_url: s.pr_url,
        })
        .collect();
    let pass_rate = if total_submissions > 0 {
        round1(passed_count as f64 / total_submissions as f64 * 100.0)
    } else {
        0.0
    };

    AssignmentSummary {
        id: repository.to_string(),
        title: info.title.unwrap_or_else(|| repository.to_string()),
        chapter: info.chapter.unwrap_or_default(),
        repository: repository.to_string(),
        url: format!("https://github.com/{repository}"),
        total_submissions,
        passed_count,
        best_practice_count: best_practice_users.len(),
        pass_rate,
        best_practice_users,
    }
}

/// First number in a chapter label; labels without one sort last.
fn chapter_number(chapter: &str) -> u32 {
    chapter
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|part| part.parse().ok())
        .unwrap_or(u32::MAX)
}

pub fn overall(summaries: &[AssignmentSummary]) -> AssignmentStats {
    let average_pass_rate = if summaries.is_empty() {
        0.0
    } else {
        round1(summaries.iter().map(|s| s.pass_rate).sum::<f64>() / summaries.len() as f64)
    };

    AssignmentStats {
        total_assignments: summaries.len(),
        total_submissions: summaries.iter().map(|s| s.total_submissions).sum(),
        total_best_practices: summaries.iter().map(|s| s.best_practice_count).sum(),
        average_pass_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assignment_details, index_pull_requests, pr::tests::pull_request, GithubIdentity,
        UserAssignment, UserRecord,
    };

    fn assignment(url: &str, passed: bool, best: bool) -> UserAssignment {
        UserAssignment {
            passed,
            the_best: best.then_some(true),
            url: url.to_string(),
            assignment_name: "A".to_string(),
            week: None,
        }
    }

    fn user(name: &str, assignments: Vec<UserAssignment>) -> UserRecord {
        let mut record = UserRecord::new(name.to_string(), GithubIdentity::default());
        record.assignments = assignments;
        record
    }

    #[test]
    fn summaries_count_each_user_once_per_repository() {
        let details = assignment_details(&index_pull_requests([
            pull_request(1, "alice", "https://github.com/org/week1/pull/1"),
            pull_request(2, "alice", "https://github.com/org/week1/pull/2"),
            pull_request(3, "bob", "https://github.com/org/week1/pull/3"),
            pull_request(4, "bob", "https://github.com/org/week2/pull/1"),
        ]));
        let users: UserMap = [
            (
                "alice".to_string(),
                user(
                    "Alice",
                    vec![
                        assignment("https://github.com/org/week1/pull/1/", true, true),
                        assignment("https://github.com/org/week1/pull/2", false, false),
                    ],
                ),
            ),
            (
                "bob".to_string(),
                user(
                    "Bob",
                    vec![
                        assignment("https://github.com/org/week1/pull/3", false, false),
                        assignment("https://github.com/org/week2/pull/1", true, false),
                        assignment("https://github.com/org/week2/pull/404", true, false),
                    ],
                ),
            ),
        ]
        .into_iter()
        .collect();
        let catalog: AssignmentCatalog = [(
            "org/week2".to_string(),
            AssignmentInfo {
                chapter: Some("1. Basics".to_string()),
                title: Some("Week two".to_string()),
            },
        )]
        .into_iter()
        .collect();

        let summaries = summarize(&users, &details, &catalog);

        assert_eq!(summaries.len(), 2);
        let week2 = &summaries[0];
        assert_eq!(week2.repository, "org/week2");
        assert_eq!(week2.title, "Week two");
        assert_eq!(week2.total_submissions, 1);
        assert_eq!(week2.pass_rate, 100.0);

        let week1 = &summaries[1];
        assert_eq!(week1.title, "org/week1");
        assert_eq!(week1.url, "https://github.com/org/week1");
        assert_eq!(week1.total_submissions, 2);
        assert_eq!(week1.passed_count, 1);
        assert_eq!(week1.pass_rate, 50.0);
        assert_eq!(
            week1.best_practice_users,
            vec![BestPracticeUser {
                assignment_id: 1,
                user_id: "alice".to_string(),
                user_name: "Alice".to_string(),
                pr_url: "https://github.com/org/week1/pull/1/".to_string(),
            }]
        );

        let stats = overall(&summaries);
        assert_eq!(stats.total_assignments, 2);
        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.total_best_practices, 1);
        assert_eq!(stats.average_pass_rate, 75.0);
    }

    #[test]
    fn chapters_sort_by_number() {
        assert_eq!(chapter_number("2. Clean code"), 2);
        assert_eq!(chapter_number("Chapter 10"), 10);
        assert_eq!(chapter_number("Extra"), u32::MAX);
    }

    #[test]
    fn empty_dataset_has_zero_stats() {
        assert_eq!(overall(&[]), AssignmentStats::default());
    }
}
