use crate::{GithubProfile, PullRequest, PullRequestAuthor};

impl TryFrom<octocrab::models::pulls::PullRequest> for PullRequest {
    type Error = anyhow::Error;

    fn try_from(pr: octocrab::models::pulls::PullRequest) -> anyhow::Result<Self> {
        let body = pr.body.or(pr.body_text).or(pr.body_html);

        if let (Some(html_url), Some(user), Some(created_at), Some(updated_at)) =
            (pr.html_url, pr.user, pr.created_at, pr.updated_at)
        {
            Ok(Self {
                id: pr.id.0,
                number: pr.number,
                html_url: html_url.to_string(),
                title: pr.title.unwrap_or_default(),
                body,
                user: PullRequestAuthor {
                    id: user.id.0,
                    login: user.login,
                    avatar_url: user.avatar_url.to_string(),
                    html_url: user.html_url.to_string(),
                },
                created_at,
                updated_at,
            })
        } else {
            Err(anyhow::anyhow!(
                "Pull request #{} is missing required fields",
                pr.number
            ))
        }
    }
}

impl From<octocrab::models::UserProfile> for GithubProfile {
    fn from(profile: octocrab::models::UserProfile) -> Self {
        Self {
            login: profile.login,
            id: Some(profile.id.0),
            name: profile.name,
            avatar_url: Some(profile.avatar_url.to_string()),
            html_url: Some(profile.html_url.to_string()),
            url: Some(profile.url.to_string()),
            company: profile.company,
            blog: profile.blog,
            location: profile.location,
            email: profile.email,
            bio: profile.bio,
            followers: Some(profile.followers),
            following: Some(profile.following),
        }
    }
}
