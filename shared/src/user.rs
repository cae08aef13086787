use serde::{Deserialize, Serialize};

use crate::{AssignmentResult, GithubIdentity, Week};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignment {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub the_best: Option<bool>,
    pub url: String,
    pub assignment_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<Week>,
}

impl UserAssignment {
    pub fn is_best_practice(&self) -> bool {
        self.the_best.unwrap_or_default()
    }
}

impl From<&AssignmentResult> for UserAssignment {
    fn from(result: &AssignmentResult) -> Self {
        Self {
            passed: result.passed,
            the_best: result.the_best,
            url: result.assignment.url.clone(),
            assignment_name: result.assignment.name.clone(),
            week: result.assignment.week.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub score: f64,
    /// 1-based; users with equal scores share a rank.
    pub rank: usize,
    pub passed_count: usize,
    pub best_practice_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub github: GithubIdentity,
    pub assignments: Vec<UserAssignment>,
    #[serde(default)]
    pub ranking: Ranking,
}

impl UserRecord {
    pub fn new(name: String, github: GithubIdentity) -> Self {
        Self {
            name,
            github,
            assignments: vec![],
            ranking: Ranking::default(),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.passed).count()
    }

    pub fn best_practice_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.is_best_practice())
            .count()
    }
}
