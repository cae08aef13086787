use std::collections::BTreeMap;

mod app_data;
mod assignment;
mod pr;
mod profile;
mod user;

pub mod ranking;
pub mod reconcile;
pub mod routes;
pub mod stats;

#[cfg(feature = "github")]
pub mod github;

pub use app_data::*;
pub use assignment::*;
pub use pr::*;
pub use profile::*;
pub use user::*;

pub type GithubHandle = String;

/// Feedback text keyed by the submitted assignment URL.
pub type FeedbackMap = BTreeMap<String, String>;

/// Users keyed by GitHub login. Ordered so the dataset serializes identically on every run.
pub type UserMap = BTreeMap<GithubHandle, UserRecord>;
