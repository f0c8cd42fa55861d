// GitHub tools: pull requests, issues, repositories and releases

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_enum, json_schema_number, json_schema_object, json_schema_string, Tool,
    ToolRegistry, ToolTier,
};
use anyhow::{Context, Result};
use ghbridge_core::params::{parse_limit, DEFAULT_BASE_BRANCH, DEFAULT_RELEASE_LIMIT};
use ghbridge_core::{
    GatewayResult, GitHubGateway, IssueState, MergeMethod, NewPullRequest, PrState,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Register every GitHub tool against one gateway, in catalog order.
pub fn register_github_tools(
    registry: &mut ToolRegistry,
    gateway: Arc<dyn GitHubGateway>,
) -> Result<()> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(GetPrInfoTool::new(gateway.clone())),
        Arc::new(ListIssuesTool::new(gateway.clone())),
        Arc::new(CreateIssueTool::new(gateway.clone())),
        Arc::new(ListPrsTool::new(gateway.clone())),
        Arc::new(MergePrTool::new(gateway.clone())),
        Arc::new(CreatePrTool::new(gateway.clone())),
        Arc::new(GetRepoInfoTool::new(gateway.clone())),
        Arc::new(ListReleasesTool::new(gateway)),
    ];
    for tool in tools {
        registry.register(tool)?;
    }
    Ok(())
}

/// A JSON string or number, as agents send ids and limits either way
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
}

impl Loose {
    fn into_string(self) -> String {
        match self {
            Loose::Text(s) => s,
            Loose::Number(n) => n.to_string(),
        }
    }
}

fn respond(result: GatewayResult<String>) -> CallToolResult {
    match result {
        Ok(output) => CallToolResult::text(output),
        Err(e) => CallToolResult::error(e.to_string()),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {}", tool))
}

fn owner_repo_properties() -> serde_json::Value {
    serde_json::json!({
        "owner": json_schema_string("Repository owner (user or organization)"),
        "repo": json_schema_string("Repository name")
    })
}

fn with_properties(mut base: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        base.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    base
}

#[derive(Debug, Deserialize)]
struct RepoArgs {
    owner: String,
    repo: String,
}

#[derive(Debug, Deserialize)]
struct PrNumberArgs {
    owner: String,
    repo: String,
    pr_number: Loose,
}

#[derive(Debug, Deserialize)]
struct StateArgs {
    owner: String,
    repo: String,
    #[serde(default)]
    state: Option<String>,
}

/// Tool to look up a single pull request
pub struct GetPrInfoTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl GetPrInfoTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for GetPrInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_pr_info".to_string(),
            description: "Get detailed information about a pull request as JSON".to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "pr_number": json_schema_number("Pull request number")
                    }),
                ),
                vec!["owner", "repo", "pr_number"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: PrNumberArgs = parse_args("get_pr_info", arguments)?;
        let pr_number = args.pr_number.into_string();

        Ok(respond(
            self.gateway
                .get_pr_info(&args.owner, &args.repo, &pr_number)
                .await,
        ))
    }
}

/// Tool to list issues in a repository
pub struct ListIssuesTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl ListIssuesTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for ListIssuesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_issues".to_string(),
            description: "List issues in a repository as JSON".to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "state": json_schema_enum(
                            IssueState::ALLOWED,
                            "open",
                            "Filter by state (default: open)"
                        )
                    }),
                ),
                vec!["owner", "repo"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: StateArgs = parse_args("list_issues", arguments)?;
        let state = args
            .state
            .as_deref()
            .map(IssueState::coerce)
            .unwrap_or_default();

        Ok(respond(
            self.gateway.list_issues(&args.owner, &args.repo, state).await,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct CreateIssueArgs {
    owner: String,
    repo: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
}

/// Tool to open a new issue
pub struct CreateIssueTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl CreateIssueTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for CreateIssueTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_issue".to_string(),
            description: "Create a new issue. Returns the URL of the created issue".to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "title": json_schema_string("Issue title"),
                        "body": json_schema_string("Issue body in Markdown (default: empty)")
                    }),
                ),
                vec!["owner", "repo", "title"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: CreateIssueArgs = parse_args("create_issue", arguments)?;
        let body = args.body.unwrap_or_default();

        Ok(respond(
            self.gateway
                .create_issue(&args.owner, &args.repo, &args.title, &body)
                .await,
        ))
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}

/// Tool to list pull requests in a repository
pub struct ListPrsTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl ListPrsTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for ListPrsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_prs".to_string(),
            description: "List pull requests in a repository as JSON".to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "state": json_schema_enum(
                            PrState::ALLOWED,
                            "open",
                            "Filter by state (default: open)"
                        )
                    }),
                ),
                vec!["owner", "repo"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: StateArgs = parse_args("list_prs", arguments)?;
        let state = args
            .state
            .as_deref()
            .map(PrState::coerce)
            .unwrap_or_default();

        Ok(respond(
            self.gateway.list_prs(&args.owner, &args.repo, state).await,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct MergePrArgs {
    owner: String,
    repo: String,
    pr_number: Loose,
    #[serde(default)]
    merge_method: Option<String>,
}

/// Tool to merge a pull request
pub struct MergePrTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl MergePrTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for MergePrTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "merge_pr".to_string(),
            description: "Merge a pull request. This changes the target branch and cannot be undone"
                .to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "pr_number": json_schema_number("Pull request number"),
                        "merge_method": json_schema_enum(
                            MergeMethod::ALLOWED,
                            "merge",
                            "Merge strategy (default: merge)"
                        )
                    }),
                ),
                vec!["owner", "repo", "pr_number"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: MergePrArgs = parse_args("merge_pr", arguments)?;
        let pr_number = args.pr_number.into_string();
        let method = args
            .merge_method
            .as_deref()
            .map(MergeMethod::coerce)
            .unwrap_or_default();

        Ok(respond(
            self.gateway
                .merge_pr(&args.owner, &args.repo, &pr_number, method)
                .await,
        ))
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier2
    }
}

#[derive(Debug, Deserialize)]
struct CreatePrArgs {
    owner: String,
    repo: String,
    title: String,
    head: String,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Tool to open a new pull request
pub struct CreatePrTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl CreatePrTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for CreatePrTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_pr".to_string(),
            description: "Create a pull request from a head branch. Returns the URL of the created pull request"
                .to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "title": json_schema_string("Pull request title"),
                        "head": json_schema_string("Branch containing the changes"),
                        "base": json_schema_string("Branch to merge into (default: main)"),
                        "body": json_schema_string("Pull request description in Markdown (default: empty)")
                    }),
                ),
                vec!["owner", "repo", "title", "head"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: CreatePrArgs = parse_args("create_pr", arguments)?;
        let base = args.base.as_deref().unwrap_or(DEFAULT_BASE_BRANCH);
        let body = args.body.as_deref().unwrap_or_default();

        Ok(respond(
            self.gateway
                .create_pr(
                    &args.owner,
                    &args.repo,
                    NewPullRequest {
                        title: &args.title,
                        body,
                        head: &args.head,
                        base,
                    },
                )
                .await,
        ))
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}

/// Tool to look up repository metadata
pub struct GetRepoInfoTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl GetRepoInfoTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for GetRepoInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_repo_info".to_string(),
            description: "Get repository information (description, default branch, stars, forks) as JSON"
                .to_string(),
            input_schema: json_schema_object(owner_repo_properties(), vec!["owner", "repo"]),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: RepoArgs = parse_args("get_repo_info", arguments)?;

        Ok(respond(
            self.gateway.get_repo_info(&args.owner, &args.repo).await,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ListReleasesArgs {
    owner: String,
    repo: String,
    #[serde(default)]
    limit: Option<Loose>,
}

/// Tool to list releases of a repository
pub struct ListReleasesTool {
    gateway: Arc<dyn GitHubGateway>,
}

impl ListReleasesTool {
    pub fn new(gateway: Arc<dyn GitHubGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl Tool for ListReleasesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_releases".to_string(),
            description: "List releases of a repository as JSON, newest first".to_string(),
            input_schema: json_schema_object(
                with_properties(
                    owner_repo_properties(),
                    serde_json::json!({
                        "limit": json_schema_number("Maximum number of releases, 1-100 (default: 10)")
                    }),
                ),
                vec!["owner", "repo"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ListReleasesArgs = parse_args("list_releases", arguments)?;
        let limit = args
            .limit
            .map(|l| parse_limit(&l.into_string()))
            .unwrap_or(DEFAULT_RELEASE_LIMIT);

        Ok(respond(
            self.gateway
                .list_releases(&args.owner, &args.repo, limit)
                .await,
        ))
    }
}
