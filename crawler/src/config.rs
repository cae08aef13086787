use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use shared::{ranking::WeightedPassRate, stats::AssignmentCatalog};

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_best_practice_bonus")]
    pub best_practice_bonus: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            best_practice_bonus: default_best_practice_bonus(),
        }
    }
}

impl RankingConfig {
    pub fn policy(&self) -> WeightedPassRate {
        WeightedPassRate {
            best_practice_bonus: self.best_practice_bonus,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL of the published site, e.g. `https://example.github.io/front_7th`.
    pub url: String,
}

/// One course batch: which repositories hold the submissions and where the output goes.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub organization: String,
    pub repos: Vec<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Refetch assignment results on every run instead of reusing the snapshot.
    #[serde(default = "default_refresh")]
    pub refresh_assignment_results: bool,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub site: Option<SiteConfig>,
    #[serde(default)]
    pub assignments: AssignmentCatalog,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

const fn default_refresh() -> bool {
    true
}

const fn default_best_practice_bonus() -> f64 {
    0.5
}

impl PipelineConfig {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid pipeline config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.organization.trim().is_empty() {
            anyhow::bail!("`organization` must not be empty");
        }
        if self.repos.is_empty() {
            anyhow::bail!("`repos` must list at least one repository");
        }
        if let Some(repo) = self.repos.iter().find(|repo| repo.trim().is_empty()) {
            anyhow::bail!("`repos` contains an empty name: {repo:?}");
        }
        Ok(())
    }

    /// The assignment count ranking is measured against: one assignment per repository.
    pub fn total_assignments(&self) -> usize {
        self.repos.len()
    }

    pub fn full_name(&self, repo: &str) -> String {
        format!("{}/{repo}", self.organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = PipelineConfig::from_toml(include_str!("../../Pipeline.toml")).unwrap();

        assert_eq!(config.organization, "hanghae-plus");
        assert_eq!(config.total_assignments(), config.repos.len());
        assert!(config.refresh_assignment_results);
        assert_eq!(config.repos.len(), 10);
        assert_eq!(config.data_dir, PathBuf::from("docs/data"));
        assert!(config.site.is_some());
        assert_eq!(
            config.assignments["hanghae-plus/front_7th_chapter2-1"]
                .chapter
                .as_deref(),
            Some("2. 클린코드")
        );
    }

    #[test]
    fn defaults_apply() {
        let config = PipelineConfig::from_toml(
            r#"
            organization = "org"
            repos = ["week1"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.ranking.best_practice_bonus, 0.5);
        assert!(config.site.is_none());
        assert!(config.assignments.is_empty());
        assert_eq!(config.full_name("week1"), "org/week1");
    }

    #[test]
    fn empty_repository_list_is_rejected() {
        let err = PipelineConfig::from_toml(
            r#"
            organization = "org"
            repos = []
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("repos"));
    }

    #[test]
    fn empty_organization_is_rejected() {
        assert!(PipelineConfig::from_toml("organization = \"\"\nrepos = [\"a\"]").is_err());
    }
}
