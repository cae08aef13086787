use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{GithubHandle, PullRequestAuthor};

/// Public profile as stored in `github-profiles.json`. Every field except the login may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubProfile {
    pub login: GithubHandle,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub following: Option<u64>,
}

pub type ProfileIndex = HashMap<GithubHandle, GithubProfile>;

pub fn index_profiles(profiles: impl IntoIterator<Item = GithubProfile>) -> ProfileIndex {
    profiles
        .into_iter()
        .map(|profile| (profile.login.clone(), profile))
        .collect()
}

/// The `github` block of a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubIdentity {
    pub name: String,
    pub id: String,
    pub login: GithubHandle,
    pub avatar_url: String,
    pub html_url: String,
    pub url: String,
    pub company: String,
    pub blog: String,
    pub location: String,
    pub email: String,
    pub bio: String,
    pub followers: u64,
    pub following: u64,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn pick(value: Option<&Option<String>>, fallback: &str) -> String {
    value.and_then(present).unwrap_or(fallback).to_string()
}

impl GithubIdentity {
    /// Builds the identity from an optional profile.
    ///
    /// Empty or missing profile fields fall back to the pull request author (id, login, avatar,
    /// html url) and to the submitter's display name for `name`. Everything else defaults to an
    /// empty string or 0.
    pub fn resolve(
        profile: Option<&GithubProfile>,
        author: &PullRequestAuthor,
        display_name: &str,
    ) -> Self {
        Self {
            name: pick(profile.map(|p| &p.name), display_name),
            id: profile
                .and_then(|p| p.id)
                .unwrap_or(author.id)
                .to_string(),
            login: profile
                .map(|p| p.login.as_str())
                .filter(|login| !login.is_empty())
                .unwrap_or(&author.login)
                .to_string(),
            avatar_url: pick(profile.map(|p| &p.avatar_url), &author.avatar_url),
            html_url: pick(profile.map(|p| &p.html_url), &author.html_url),
            url: pick(profile.map(|p| &p.url), ""),
            company: pick(profile.map(|p| &p.company), ""),
            blog: pick(profile.map(|p| &p.blog), ""),
            location: pick(profile.map(|p| &p.location), ""),
            email: pick(profile.map(|p| &p.email), ""),
            bio: pick(profile.map(|p| &p.bio), ""),
            followers: profile.and_then(|p| p.followers).unwrap_or_default(),
            following: profile.and_then(|p| p.following).unwrap_or_default(),
        }
    }
}
