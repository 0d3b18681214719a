//! External collaborators: source control, notifications, user store
//!
//! Each collaborator is a trait seam with a production implementation;
//! handlers only see the trait, so tests inject stubs.

mod github;
mod notify;
mod users;

pub use github::{parse_github_target, GitHubClient, IssueInfo, PullRequestInfo, SourceControl};
pub use notify::{Notifier, WebhookNotifier};
pub use users::{InMemoryUserStore, Owner, UserStore};
