// MCP tool registry and dispatch

use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult>;

    /// Get the tool's tier
    fn tier(&self) -> ToolTier {
        ToolTier::Tier0
    }
}

/// Tool security tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolTier {
    /// Read-only operations
    Tier0,
    /// Creates new state on the remote (issues, pull requests)
    Tier1,
    /// Changes existing state irreversibly (merges)
    Tier2,
}

impl ToolTier {
    pub fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only_hint: *self == ToolTier::Tier0,
            destructive_hint: *self == ToolTier::Tier2,
        }
    }
}

/// Tool registry for managing available tools.
///
/// Listing order is registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.schema().name;
        if self.index.contains_key(&name) {
            bail!("Tool already registered: {}", name);
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// List all tool schemas, annotated with their tier
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                annotations: Some(t.tier().annotations()),
                ..t.schema()
            })
            .collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name.
    ///
    /// Never fails: unknown tools, missing arguments and execution errors
    /// all come back as an error result so the session survives.
    pub async fn call(&self, name: &str, arguments: Option<serde_json::Value>) -> CallToolResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!("Call to unknown tool: {}", name);
            return CallToolResult::error(format!("Unknown tool: {}", name));
        };

        let Some(arguments) = arguments else {
            tracing::warn!("Call to {} without arguments", name);
            return CallToolResult::error("Missing arguments");
        };

        tracing::debug!("Calling tool {}", name);
        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Tool {} failed: {:#}", name, e);
                CallToolResult::error(format!("{:#}", e))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], default: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "default": default,
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct EchoTool {
        name: &'static str,
        tier: ToolTier,
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.to_string(),
                description: "Echo the arguments back".to_string(),
                input_schema: json_schema_object(json!({}), vec![]),
                annotations: None,
            }
        }

        async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
            if arguments.get("fail").is_some() {
                bail!("asked to fail");
            }
            Ok(CallToolResult::text(arguments.to_string()))
        }

        fn tier(&self) -> ToolTier {
            self.tier
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for (name, tier) in [
            ("zeta", ToolTier::Tier0),
            ("alpha", ToolTier::Tier1),
            ("mid", ToolTier::Tier2),
        ] {
            registry.register(Arc::new(EchoTool { name, tier })).unwrap();
        }
        registry
    }

    #[test]
    fn test_listing_keeps_registration_order() {
        let names: Vec<_> = registry()
            .list_schemas()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let err = registry
            .register(Arc::new(EchoTool {
                name: "alpha",
                tier: ToolTier::Tier0,
            }))
            .unwrap_err();
        assert!(err.to_string().contains("alpha"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_annotations_follow_tier() {
        let schemas = registry().list_schemas();

        assert_eq!(schemas[0].annotations, Some(ToolTier::Tier0.annotations()));
        assert!(schemas[0].annotations.unwrap().read_only_hint);
        assert!(!schemas[1].annotations.unwrap().read_only_hint);
        assert!(!schemas[1].annotations.unwrap().destructive_hint);
        assert!(schemas[2].annotations.unwrap().destructive_hint);
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = registry().call("nope", Some(json!({}))).await;
        assert!(result.is_error());
        assert_eq!(result.text_content(), "Error: Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_call_missing_arguments() {
        let result = registry().call("alpha", None).await;
        assert!(result.is_error());
        assert_eq!(result.text_content(), "Error: Missing arguments");
    }

    #[tokio::test]
    async fn test_call_wraps_errors() {
        let registry = registry();

        let ok = registry.call("alpha", Some(json!({"x": 1}))).await;
        assert!(!ok.is_error());
        assert_eq!(ok.text_content(), r#"{"x":1}"#);

        let failed = registry.call("alpha", Some(json!({"fail": true}))).await;
        assert!(failed.is_error());
        assert_eq!(failed.text_content(), "Error: asked to fail");
    }
}
