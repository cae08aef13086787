use std::path::PathBuf;

use assignment_board_crawler::{
    api::{CourseClient, GithubClient},
    config::PipelineConfig,
    pipeline::{self, Sources},
    snapshot::SnapshotStore,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Deserialize)]
struct Env {
    github_token: String,
    course_api: String,
    course_assignments_status_id: String,
    course_api_token: Option<String>,
    #[serde(default = "default_pipeline_config")]
    pipeline_config: PathBuf,
    data_dir: Option<PathBuf>,
}

fn default_pipeline_config() -> PathBuf {
    PathBuf::from("Pipeline.toml")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = PipelineConfig::load_from_file(&env.pipeline_config)?;
    if let Some(data_dir) = env.data_dir {
        config.data_dir = data_dir;
    }
    let store = SnapshotStore::new(&config.data_dir);

    let github = GithubClient::new(env.github_token)?;
    let course = CourseClient::new(
        env.course_api,
        env.course_assignments_status_id,
        env.course_api_token,
    )?;

    let dataset = pipeline::run(
        &config,
        &store,
        Sources {
            pulls: &github,
            profiles: &github,
            assignments: &course,
        },
        Utc::now(),
    )
    .await?;

    info!(
        "Done: {} users, {} dropped results, {} duplicates",
        dataset.app_data.users.len(),
        dataset.dropped.len(),
        dataset.duplicates.len()
    );
    Ok(())
}
