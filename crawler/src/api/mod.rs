use async_trait::async_trait;
use shared::{AssignmentResult, GithubProfile, PullRequest};
use tracing::{instrument, warn};

mod course;
pub use course::*;

#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Every pull request of `organization/repo`, open or closed.
    async fn pull_requests(&self, organization: &str, repo: &str)
        -> anyhow::Result<Vec<PullRequest>>;
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile(&self, login: &str) -> anyhow::Result<GithubProfile>;
}

#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Graded results of the whole batch, sorted by assignment name and then submitter name.
    async fn assignment_results(&self) -> anyhow::Result<Vec<AssignmentResult>>;
}

#[derive(Clone)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
}

impl GithubClient {
    pub fn new(github_token: String) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()?;
        Ok(Self { octocrab })
    }
}

#[async_trait]
impl PullRequestSource for GithubClient {
    #[instrument(skip(self))]
    async fn pull_requests(
        &self,
        organization: &str,
        repo: &str,
    ) -> anyhow::Result<Vec<PullRequest>> {
        let page = self
            .octocrab
            .pulls(organization, repo)
            .list()
            .state(octocrab::params::State::All)
            .per_page(100)
            .send()
            .await?;
        let pulls = self.octocrab.all_pages(page).await?;

        Ok(pulls
            .into_iter()
            .filter_map(|pr| match PullRequest::try_from(pr) {
                Ok(pr) => Some(pr),
                Err(e) => {
                    warn!("Skipping pull request in {organization}/{repo}: {e}");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl ProfileSource for GithubClient {
    #[instrument(skip(self))]
    async fn profile(&self, login: &str) -> anyhow::Result<GithubProfile> {
        Ok(self.octocrab.users(login).profile().await?.into())
    }
}
