use serde::{Deserialize, Serialize};

use crate::{
    stats::{AssignmentStats, AssignmentSummary},
    AssignmentDetails, FeedbackMap, UserMap,
};

/// The dataset consumed by the site renderer, written as `app-data.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub users: UserMap,
    pub feedbacks: FeedbackMap,
    pub assignment_details: AssignmentDetails,
    #[serde(default)]
    pub assignment_summaries: Vec<AssignmentSummary>,
    #[serde(default)]
    pub assignment_stats: AssignmentStats,
}
