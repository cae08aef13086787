//! The batch job: fetch pull requests, profiles and results, reconcile, write the dataset.

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use itertools::Itertools;
use shared::{
    assignment_details, collect_feedbacks, index_profiles, index_pull_requests,
    ranking::{with_ranking, RankingPolicy},
    reconcile::{DroppedResult, DuplicateResult, Reconciler},
    routes::{robots_txt, routes, sitemap},
    stats::{overall, summarize},
    AppData, AssignmentResult, GithubProfile, PullRequest,
};
use tracing::{debug, info, instrument};

use crate::{
    api::{AssignmentSource, ProfileSource, PullRequestSource},
    config::{PipelineConfig, SiteConfig},
    snapshot::{Snapshot, SnapshotStore},
};

pub const PROFILES_KEY: &str = "github-profiles.json";
pub const RESULTS_KEY: &str = "user-assignment-infos.json";
pub const DATASET_KEY: &str = "app-data.json";
pub const SITEMAP_KEY: &str = "sitemap.xml";
pub const ROBOTS_KEY: &str = "robots.txt";

pub fn pulls_key(repo: &str) -> String {
    format!("repos/{repo}/pulls.json")
}

pub struct Sources<'a> {
    pub pulls: &'a dyn PullRequestSource,
    pub profiles: &'a dyn ProfileSource,
    pub assignments: &'a dyn AssignmentSource,
}

/// The dataset plus what reconciliation left out of it.
#[derive(Debug)]
pub struct Dataset {
    pub app_data: AppData,
    pub dropped: Vec<DroppedResult>,
    pub duplicates: Vec<DuplicateResult>,
}

/// Pull requests of every configured repository, from snapshots where present.
#[instrument(skip_all)]
pub async fn fetch_pulls(
    store: &SnapshotStore,
    source: &dyn PullRequestSource,
    config: &PipelineConfig,
) -> anyhow::Result<Vec<PullRequest>> {
    let snapshots = store
        .load_or_fetch_each(
            &config.repos,
            |repo| pulls_key(repo),
            |repo| async move {
                let pulls = source
                    .pull_requests(&config.organization, repo)
                    .await
                    .with_context(|| {
                        format!("Failed to fetch pull requests for {}", config.full_name(repo))
                    })?;
                info!("{} Counts: {}", config.full_name(repo), pulls.len());
                anyhow::Ok(pulls)
            },
        )
        .await?;

    Ok(snapshots
        .into_iter()
        .flat_map(Snapshot::into_inner)
        .collect())
}

/// Profiles of every distinct pull request author. Cached as a whole, never per user.
#[instrument(skip_all)]
pub async fn fetch_profiles(
    store: &SnapshotStore,
    source: &dyn ProfileSource,
    pulls: &[PullRequest],
) -> anyhow::Result<Vec<GithubProfile>> {
    let snapshot = store
        .load_or_fetch(PROFILES_KEY, || async move {
            let logins: Vec<&str> = pulls
                .iter()
                .map(|pr| pr.user.login.as_str())
                .unique()
                .collect();
            info!("Fetching {} GitHub profiles", logins.len());

            try_join_all(logins.into_iter().map(|login| async move {
                debug!("Fetching user: {login}");
                source
                    .profile(login)
                    .await
                    .with_context(|| format!("Failed to fetch GitHub profile for {login}"))
            }))
            .await
        })
        .await?;

    Ok(snapshot.into_inner())
}

#[instrument(skip_all)]
pub async fn fetch_assignment_results(
    store: &SnapshotStore,
    source: &dyn AssignmentSource,
    refresh: bool,
) -> anyhow::Result<Vec<AssignmentResult>> {
    if !refresh {
        return Ok(store
            .load_or_fetch(RESULTS_KEY, || source.assignment_results())
            .await?
            .into_inner());
    }

    let results = source
        .assignment_results()
        .await
        .context("Failed to fetch assignment results")?;
    store.save(RESULTS_KEY, &results).await?;
    info!("Saved {} assignment results", results.len());
    Ok(results)
}

/// Reconciles, ranks and summarizes. Pure apart from logging.
pub fn build_dataset(
    results: &[AssignmentResult],
    pulls: Vec<PullRequest>,
    profiles: Vec<GithubProfile>,
    config: &PipelineConfig,
    policy: &dyn RankingPolicy,
) -> Dataset {
    let pulls = index_pull_requests(pulls);
    let profiles = index_profiles(profiles);

    let reconciliation = Reconciler::new(&pulls, &profiles).reconcile(results);
    let users = with_ranking(reconciliation.users, config.total_assignments(), policy);
    let assignment_details = assignment_details(&pulls);
    let assignment_summaries = summarize(&users, &assignment_details, &config.assignments);
    let assignment_stats = overall(&assignment_summaries);

    Dataset {
        app_data: AppData {
            users,
            feedbacks: collect_feedbacks(results),
            assignment_details,
            assignment_summaries,
            assignment_stats,
        },
        dropped: reconciliation.dropped,
        duplicates: reconciliation.duplicates,
    }
}

pub async fn write_dataset(store: &SnapshotStore, app_data: &AppData) -> anyhow::Result<()> {
    store.save(DATASET_KEY, app_data).await?;
    info!("Wrote {}", store.path(DATASET_KEY).display());
    Ok(())
}

/// Writes `sitemap.xml` and `robots.txt` for the routes the renderer will generate.
pub async fn write_site_manifest(
    store: &SnapshotStore,
    app_data: &AppData,
    site: &SiteConfig,
    last_modified: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let routes = routes(&app_data.users, &app_data.assignment_details);
    store
        .save_text(SITEMAP_KEY, &sitemap(&routes, &site.url, last_modified))
        .await?;
    store.save_text(ROBOTS_KEY, &robots_txt(&site.url)).await?;
    info!("Wrote sitemap with {} routes", routes.len());
    Ok(routes.len())
}

/// Runs every stage in order. Stages whose snapshot exists are not refetched.
#[instrument(skip_all)]
pub async fn run(
    config: &PipelineConfig,
    store: &SnapshotStore,
    sources: Sources<'_>,
    now: DateTime<Utc>,
) -> anyhow::Result<Dataset> {
    let pulls = fetch_pulls(store, sources.pulls, config).await?;
    let profiles = fetch_profiles(store, sources.profiles, &pulls).await?;
    let results = fetch_assignment_results(
        store,
        sources.assignments,
        config.refresh_assignment_results,
    )
    .await?;

    let policy = config.ranking.policy();
    let dataset = build_dataset(&results, pulls, profiles, config, &policy);
    write_dataset(store, &dataset.app_data).await?;

    if let Some(site) = &config.site {
        write_site_manifest(store, &dataset.app_data, site, now).await?;
    }

    Ok(dataset)
}
