//! Pages the site renderer generates from a dataset, plus `sitemap.xml` and `robots.txt`.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;

use crate::{find_detail, AssignmentDetails, GithubHandle, UserMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Assignments,
    User(GithubHandle),
    Assignment { user: GithubHandle, id: u64 },
}

impl Route {
    fn priority(&self) -> &'static str {
        match self {
            Route::Home => "1.0",
            Route::Assignments => "0.9",
            Route::User(_) => "0.8",
            Route::Assignment { .. } => "0.7",
        }
    }

    fn change_frequency(&self) -> &'static str {
        match self {
            Route::Home => "daily",
            Route::Assignments | Route::User(_) => "weekly",
            Route::Assignment { .. } => "monthly",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Assignments => write!(f, "/assignments/"),
            Route::User(user) => write!(f, "/@{user}/"),
            Route::Assignment { user, id } => write!(f, "/@{user}/assignment/{id}/"),
        }
    }
}

/// Home, the assignments index, then every user page followed by that user's assignment pages.
///
/// Assignments without a resolvable detail id get no page.
pub fn routes(users: &UserMap, details: &AssignmentDetails) -> Vec<Route> {
    let mut routes = vec![Route::Home, Route::Assignments];

    for (login, user) in users {
        routes.push(Route::User(login.clone()));
        routes.extend(
            user.assignments
                .iter()
                .filter_map(|assignment| find_detail(details, &assignment.url))
                .map(|detail| detail.id)
                .unique()
                .map(|id| Route::Assignment {
                    user: login.clone(),
                    id,
                }),
        );
    }

    routes
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn sitemap(routes: &[Route], base_url: &str, last_modified: DateTime<Utc>) -> String {
    let base_url = base_url.trim_end_matches('/');
    let last_modified = last_modified.to_rfc3339_opts(SecondsFormat::Millis, true);

    let entries: String = routes
        .iter()
        .map(|route| {
            let location = match route {
                Route::Home => base_url.to_string(),
                route => format!("{base_url}{route}"),
            };
            format!(
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{last_modified}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
                escape_xml(&location),
                route.change_frequency(),
                route.priority(),
            )
        })
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{entries}</urlset>\n"
    )
}

pub fn robots_txt(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        base_url.trim_end_matches('/')
    )
}
