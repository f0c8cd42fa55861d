// Command gateway: GitHub operations executed through the `gh` CLI

pub mod command;
pub mod config;
pub mod error;
pub mod gateway;
pub mod gh;
pub mod params;
pub mod sanitize;

pub use command::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use config::{GatewayConfig, GatewaySettings};
pub use error::{CommandError, GatewayError, GatewayResult};
pub use gateway::{GitHubGateway, NewPullRequest, Operation};
pub use gh::GhCli;
pub use params::{IssueState, MergeMethod, PrState};
