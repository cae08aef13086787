use std::fmt;

use anyhow::Context;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Deserialize};
use shared::{adjust_results, sort_results, AssignmentRef, AssignmentResult, Week};
use tracing::{debug, info, instrument};

use super::AssignmentSource;

const PASS: &str = "PASS";

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AssignmentId {
    Number(u64),
    Text(String),
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentId::Number(id) => write!(f, "{id}"),
            AssignmentId::Text(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAssignment {
    pub assignment_id: AssignmentId,
    pub name: String,
    #[serde(default)]
    pub week: Option<Week>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub answer: Option<String>,
}

/// One submitter's row in an assignment's total-status listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatus {
    pub name: String,
    pub result: Option<String>,
    #[serde(default)]
    pub is_best_practice: Option<bool>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl SubmissionStatus {
    pub fn into_result(self, assignment: &CourseAssignment) -> AssignmentResult {
        let url = self
            .answers
            .into_iter()
            .next()
            .and_then(|answer| answer.answer)
            .map(|answer| answer.trim().to_string())
            .unwrap_or_default();

        AssignmentResult {
            passed: self.result.as_deref() == Some(PASS),
            the_best: self.is_best_practice.unwrap_or_default().then_some(true),
            name: self.name,
            feedback: self.feedback,
            assignment: AssignmentRef {
                name: assignment.name.clone(),
                url,
                week: assignment.week.clone(),
            },
        }
    }
}

/// Client for the course-management API.
#[derive(Clone)]
pub struct CourseClient {
    client: reqwest::Client,
    base_url: String,
    status_id: String,
    token: Option<String>,
}

impl CourseClient {
    pub fn new(base_url: String, status_id: String, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            status_id,
            token,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let envelope: Envelope<T> = request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("Unexpected response from {url}"))?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    pub async fn assignments(&self) -> anyhow::Result<Vec<CourseAssignment>> {
        self.get(&format!("assignments/status/{}", self.status_id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn submissions(&self, id: &AssignmentId) -> anyhow::Result<Vec<SubmissionStatus>> {
        self.get(&format!("assignment-users/total-status/{id}"))
            .await
    }
}

#[async_trait]
impl AssignmentSource for CourseClient {
    #[instrument(skip(self))]
    async fn assignment_results(&self) -> anyhow::Result<Vec<AssignmentResult>> {
        let assignments = self.assignments().await?;
        info!("Received {} assignments", assignments.len());

        let per_assignment = try_join_all(assignments.iter().map(|assignment| async move {
            let submissions = self.submissions(&assignment.assignment_id).await?;
            debug!(
                "Received {} submissions for {}",
                submissions.len(),
                assignment.name
            );
            anyhow::Ok(
                submissions
                    .into_iter()
                    .map(|submission| submission.into_result(assignment))
                    .collect::<Vec<_>>(),
            )
        }))
        .await?;

        let mut results: Vec<_> = per_assignment.into_iter().flatten().collect();
        sort_results(&mut results);
        Ok(adjust_results(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_maps_to_result() {
        let assignment: CourseAssignment = serde_json::from_str(
            r#"{"assignmentId": 17, "name": "1-1. SPA", "week": 1, "status": "DONE"}"#,
        )
        .unwrap();
        let statuses: Vec<SubmissionStatus> = serde_json::from_str(
            r#"[
                {
                    "name": "Alice",
                    "result": "PASS",
                    "isBestPractice": true,
                    "feedback": "Nice",
                    "answers": [{"answer": " https://github.com/org/repo/pull/5/ "}]
                },
                {"name": "Bob", "result": "FAIL", "isBestPractice": false, "answers": []},
                {"name": "Carol", "result": null, "answers": [{"answer": null}]}
            ]"#,
        )
        .unwrap();

        let results: Vec<_> = statuses
            .into_iter()
            .map(|status| status.into_result(&assignment))
            .collect();

        assert_eq!(assignment.assignment_id.to_string(), "17");
        assert!(results[0].passed);
        assert_eq!(results[0].the_best, Some(true));
        assert_eq!(results[0].feedback.as_deref(), Some("Nice"));
        assert_eq!(
            results[0].assignment.url,
            "https://github.com/org/repo/pull/5/"
        );
        assert_eq!(results[0].assignment.week, Some(Week::Number(1)));

        assert!(!results[1].passed);
        assert_eq!(results[1].the_best, None);
        assert_eq!(results[1].assignment.url, "");

        assert!(!results[2].passed);
        assert_eq!(results[2].assignment.url, "");
    }

    #[test]
    fn assignment_id_accepts_text() {
        let assignment: CourseAssignment =
            serde_json::from_str(r#"{"assignmentId": "abc-1", "name": "2-1"}"#).unwrap();
        assert_eq!(assignment.assignment_id, AssignmentId::Text("abc-1".to_string()));
        assert_eq!(assignment.week, None);
    }

    #[test]
    fn base_url_is_normalized() {
        let client =
            CourseClient::new("https://api.example/".to_string(), "7".to_string(), None).unwrap();
        assert_eq!(client.base_url, "https://api.example");
    }
}
