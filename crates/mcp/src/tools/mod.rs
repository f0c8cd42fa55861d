pub mod github;
mod registry;

pub use github::{
    register_github_tools, CreateIssueTool, CreatePrTool, GetPrInfoTool, GetRepoInfoTool,
    ListIssuesTool, ListPrsTool, ListReleasesTool, MergePrTool,
};
pub use registry::{
    json_schema_enum, json_schema_number, json_schema_object, json_schema_string, Tool,
    ToolRegistry, ToolTier,
};
