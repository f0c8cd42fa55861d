// Backend-neutral interface to GitHub operations

use crate::error::GatewayResult;
use crate::params::{IssueState, MergeMethod, PrState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The logical operations the gateway supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetPrInfo,
    ListIssues,
    CreateIssue,
    ListPrs,
    MergePr,
    CreatePr,
    GetRepoInfo,
    ListReleases,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::GetPrInfo,
        Operation::ListIssues,
        Operation::CreateIssue,
        Operation::ListPrs,
        Operation::MergePr,
        Operation::CreatePr,
        Operation::GetRepoInfo,
        Operation::ListReleases,
    ];

    /// Completes the sentence "Failed to ..."
    pub fn failure_label(&self) -> &'static str {
        match self {
            Self::GetPrInfo => "get PR info",
            Self::ListIssues => "list issues",
            Self::CreateIssue => "create issue",
            Self::ListPrs => "list PRs",
            Self::MergePr => "merge PR",
            Self::CreatePr => "create PR",
            Self::GetRepoInfo => "get repo info",
            Self::ListReleases => "list releases",
        }
    }

    /// Changes state on GitHub. Never retried.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::CreateIssue | Self::MergePr | Self::CreatePr)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_label())
    }
}

/// Fields of a new pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// One method per GitHub operation. Each returns the backend's raw text
/// output (JSON for lookups and listings).
///
/// String identifiers (owner, repo, numbers, branches) are untrusted and
/// validated by the implementation.
#[async_trait::async_trait]
pub trait GitHubGateway: Send + Sync {
    async fn get_pr_info(&self, owner: &str, repo: &str, pr_number: &str) -> GatewayResult<String>;

    async fn list_issues(&self, owner: &str, repo: &str, state: IssueState)
        -> GatewayResult<String>;

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> GatewayResult<String>;

    async fn list_prs(&self, owner: &str, repo: &str, state: PrState) -> GatewayResult<String>;

    async fn merge_pr(
        &self,
        owner: &str,
        repo: &str,
        pr_number: &str,
        method: MergeMethod,
    ) -> GatewayResult<String>;

    async fn create_pr(
        &self,
        owner: &str,
        repo: &str,
        pr: NewPullRequest<'_>,
    ) -> GatewayResult<String>;

    async fn get_repo_info(&self, owner: &str, repo: &str) -> GatewayResult<String>;

    async fn list_releases(&self, owner: &str, repo: &str, limit: u32) -> GatewayResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutating_operations() {
        let mutating: Vec<_> = Operation::ALL
            .iter()
            .filter(|op| op.is_mutating())
            .copied()
            .collect();

        assert_eq!(
            mutating,
            vec![Operation::CreateIssue, Operation::MergePr, Operation::CreatePr]
        );
    }

    #[test]
    fn test_failure_labels() {
        assert_eq!(Operation::GetPrInfo.to_string(), "get PR info");
        assert_eq!(Operation::MergePr.to_string(), "merge PR");
        assert_eq!(Operation::ListReleases.failure_label(), "list releases");
    }
}
