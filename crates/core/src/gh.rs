// GitHubGateway backed by the `gh` command-line tool

use crate::command::{CommandRunner, CommandSpec, ProcessRunner};
use crate::config::GatewayConfig;
use crate::error::{CommandError, GatewayError, GatewayResult};
use crate::gateway::{GitHubGateway, NewPullRequest, Operation};
use crate::params::{clamp_limit, IssueState, MergeMethod, PrState};
use crate::sanitize::sanitize_identifier;
use std::sync::Arc;

pub const PR_VIEW_FIELDS: &str = "number,title,body,state,author,headRefName,baseRefName,\
isDraft,mergeable,reviewDecision,additions,deletions,changedFiles,createdAt,updatedAt,url";
pub const PR_LIST_FIELDS: &str =
    "number,title,state,author,headRefName,baseRefName,isDraft,createdAt,updatedAt,url";
pub const ISSUE_LIST_FIELDS: &str = "number,title,state,author,labels,createdAt,updatedAt,url";
pub const REPO_VIEW_FIELDS: &str = "name,owner,description,url,defaultBranchRef,\
stargazerCount,forkCount,isPrivate,isArchived,primaryLanguage,createdAt,updatedAt";
pub const RELEASE_LIST_FIELDS: &str =
    "name,tagName,isDraft,isLatest,isPrerelease,createdAt,publishedAt";

/// Runs every operation as a single `gh` invocation.
///
/// Each call checks `gh auth status` first; identifiers are validated before
/// anything is spawned.
pub struct GhCli {
    gh_path: String,
    runner: Arc<dyn CommandRunner>,
}

impl GhCli {
    pub fn new(gh_path: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            gh_path: gh_path.into(),
            runner,
        }
    }

    /// A gateway spawning real processes with the configured limits
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.gh_path.to_string_lossy().into_owned(),
            Arc::new(ProcessRunner::from_config(config)),
        )
    }

    fn gh(&self) -> CommandSpec {
        CommandSpec::new(self.gh_path.clone())
    }

    async fn ensure_authenticated(&self) -> Result<(), CommandError> {
        let output = self.runner.run(&self.gh().args(["auth", "status"])).await?;
        if output.success() {
            Ok(())
        } else {
            Err(CommandError::NotAuthenticated)
        }
    }

    /// Validate and build the command, check auth, run it, and attribute any
    /// failure to `operation`.
    async fn execute<F>(&self, operation: Operation, build: F) -> GatewayResult<String>
    where
        F: FnOnce(CommandSpec) -> Result<CommandSpec, CommandError> + Send,
    {
        let result = async {
            let command = build(self.gh())?;
            self.ensure_authenticated().await?;

            if operation.is_mutating() {
                tracing::info!("{}: {}", operation, command);
            } else {
                tracing::debug!("{}: {}", operation, command);
            }

            self.runner.run(&command).await?.into_stdout()
        }
        .await;

        result.map_err(|e| {
            tracing::warn!("Failed to {}: {}", operation, e);
            GatewayError::new(operation, e)
        })
    }
}

fn repo_slug(owner: &str, repo: &str) -> Result<String, CommandError> {
    Ok(format!(
        "{}/{}",
        sanitize_identifier(owner)?,
        sanitize_identifier(repo)?
    ))
}

#[async_trait::async_trait]
impl GitHubGateway for GhCli {
    async fn get_pr_info(&self, owner: &str, repo: &str, pr_number: &str) -> GatewayResult<String> {
        self.execute(Operation::GetPrInfo, |gh| {
            Ok(gh
                .args(["pr", "view"])
                .flag("repo", repo_slug(owner, repo)?)
                .flag("json", PR_VIEW_FIELDS)
                .arg("--")
                .arg(sanitize_identifier(pr_number)?))
        })
        .await
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
    ) -> GatewayResult<String> {
        self.execute(Operation::ListIssues, |gh| {
            Ok(gh
                .args(["issue", "list"])
                .flag("repo", repo_slug(owner, repo)?)
                .flag("state", state)
                .flag("json", ISSUE_LIST_FIELDS))
        })
        .await
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> GatewayResult<String> {
        self.execute(Operation::CreateIssue, |gh| {
            Ok(gh
                .args(["issue", "create"])
                .flag("repo", repo_slug(owner, repo)?)
                .flag("title", title)
                .flag("body", body))
        })
        .await
    }

    async fn list_prs(&self, owner: &str, repo: &str, state: PrState) -> GatewayResult<String> {
        self.execute(Operation::ListPrs, |gh| {
            Ok(gh
                .args(["pr", "list"])
                .flag("repo", repo_slug(owner, repo)?)
                .flag("state", state)
                .flag("json", PR_LIST_FIELDS))
        })
        .await
    }

    async fn merge_pr(
        &self,
        owner: &str,
        repo: &str,
        pr_number: &str,
        method: MergeMethod,
    ) -> GatewayResult<String> {
        self.execute(Operation::MergePr, |gh| {
            Ok(gh
                .args(["pr", "merge"])
                .flag("repo", repo_slug(owner, repo)?)
                .arg(method.flag())
                .arg("--")
                .arg(sanitize_identifier(pr_number)?))
        })
        .await
    }

    async fn create_pr(
        &self,
        owner: &str,
        repo: &str,
        pr: NewPullRequest<'_>,
    ) -> GatewayResult<String> {
        self.execute(Operation::CreatePr, |gh| {
            Ok(gh
                .args(["pr", "create"])
                .flag("repo", repo_slug(owner, repo)?)
                .flag("title", pr.title)
                .flag("body", pr.body)
                .flag("head", sanitize_identifier(pr.head)?)
                .flag("base", sanitize_identifier(pr.base)?))
        })
        .await
    }

    async fn get_repo_info(&self, owner: &str, repo: &str) -> GatewayResult<String> {
        self.execute(Operation::GetRepoInfo, |gh| {
            Ok(gh
                .args(["repo", "view"])
                .flag("json", REPO_VIEW_FIELDS)
                .arg("--")
                .arg(repo_slug(owner, repo)?))
        })
        .await
    }

    async fn list_releases(&self, owner: &str, repo: &str, limit: u32) -> GatewayResult<String> {
        self.execute(Operation::ListReleases, |gh| {
            Ok(gh
                .args(["release", "list"])
                .flag("repo", repo_slug(owner, repo)?)
                .flag("limit", clamp_limit(limit.into()))
                .flag("json", RELEASE_LIST_FIELDS))
        })
        .await
    }
}
