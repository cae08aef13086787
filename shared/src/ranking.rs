use crate::{Ranking, UserAssignment, UserMap};

/// Turns a user's kept submissions into a score. Higher is better.
pub trait RankingPolicy {
    fn score(&self, assignments: &[UserAssignment], total_assignments: usize) -> f64;
}

/// Passed submissions plus a bonus per best practice, as a percentage of the configured
/// assignment count, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPassRate {
    pub best_practice_bonus: f64,
}

impl Default for WeightedPassRate {
    fn default() -> Self {
        Self {
            best_practice_bonus: 0.5,
        }
    }
}

impl RankingPolicy for WeightedPassRate {
    fn score(&self, assignments: &[UserAssignment], total_assignments: usize) -> f64 {
        if total_assignments == 0 {
            return 0.0;
        }

        let passed = assignments.iter().filter(|a| a.passed).count() as f64;
        let best = assignments.iter().filter(|a| a.is_best_practice()).count() as f64;
        round1((passed + self.best_practice_bonus * best) / total_assignments as f64 * 100.0)
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scores every user with `policy` and assigns competition ranks (1, 2, 2, 4, ...).
pub fn with_ranking(
    mut users: UserMap,
    total_assignments: usize,
    policy: &dyn RankingPolicy,
) -> UserMap {
    for user in users.values_mut() {
        user.ranking = Ranking {
            score: policy.score(&user.assignments, total_assignments),
            rank: 0,
            passed_count: user.passed_count(),
            best_practice_count: user.best_practice_count(),
        };
    }

    let mut scores: Vec<f64> = users.values().map(|u| u.ranking.score).collect();
    scores.sort_by(|a, b| b.total_cmp(a));

    for user in users.values_mut() {
        let score = user.ranking.score;
        user.ranking.rank = scores.partition_point(|other| *other > score) + 1;
    }

    users
}
