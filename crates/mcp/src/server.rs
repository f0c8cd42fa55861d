// MCP server: newline-delimited JSON-RPC over stdio

use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

pub const SERVER_NAME: &str = "ghbridge-mcp";

/// Longest accepted request line
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        tracing::info!(
            "MCP server listening on stdio ({} tools)",
            self.registry.len()
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Read requests line by line and answer them in order.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let codec =
            AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_BYTES);
        let mut frames = FramedRead::new(reader, codec);
        // After a decode error the stream yields one `None` before resuming.
        let mut resuming = false;

        loop {
            let Some(frame) = frames.next().await else {
                if std::mem::take(&mut resuming) {
                    continue;
                }
                break;
            };

            let response = match frame {
                Ok(chunk) => match std::str::from_utf8(&chunk) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => self.handle_message(line).await,
                    Err(e) => {
                        tracing::warn!("Request is not valid UTF-8: {}", e);
                        Some(JsonRpcResponse::error(
                            serde_json::Value::Null,
                            JsonRpcError::parse_error(),
                        ))
                    }
                },
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    tracing::warn!("Request exceeded {} bytes", MAX_LINE_BYTES);
                    // The codec skips the rest of the line before framing again
                    resuming = true;
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::invalid_request(),
                    ))
                }
                Err(AnyDelimiterCodecError::Io(e)) => {
                    return Err(e).context("Failed to read from stdin");
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer
                    .write_all(out.as_bytes())
                    .await
                    .context("Failed to write response")?;
                writer.flush().await.context("Failed to flush response")?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one raw JSON-RPC line. Returns `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!("Unparsable request: {}", e);
                Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Received {}", request.method);

        if request.is_notification() {
            if request.method != "notifications/initialized" {
                tracing::debug!("Ignoring notification {}", request.method);
            }
            return None;
        }
        let id = request.id.clone().unwrap_or_default();

        let response = match request.method.as_str() {
            "initialize" => {
                if let Some(params) = request.params {
                    match serde_json::from_value::<InitializeParams>(params) {
                        Ok(params) => tracing::info!(
                            "Client {} {} connected (protocol {})",
                            params.client_info.name,
                            params.client_info.version,
                            params.protocol_version
                        ),
                        Err(e) => tracing::debug!("Unrecognized initialize params: {}", e),
                    }
                }
                respond(id, &initialize_result())
            }
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => respond(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => {
                let params = request
                    .params
                    .map(serde_json::from_value::<CallToolParams>)
                    .transpose();
                match params {
                    Ok(Some(params)) => {
                        let result = self.registry.call(&params.name, params.arguments).await;
                        respond(id, &result)
                    }
                    Ok(None) => JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ),
                    Err(e) => JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid params for tools/call: {}", e)),
                    ),
                }
            }
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(method))
            }
        };

        Some(response)
    }
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: false,
            }),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}

fn respond(id: serde_json::Value, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CallToolResult, ToolSchema};
    use crate::tools::{json_schema_object, Tool};
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct UpperTool;

    #[async_trait::async_trait]
    impl Tool for UpperTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "upper".to_string(),
                description: "Upper-case a string".to_string(),
                input_schema: json_schema_object(json!({}), vec!["text"]),
                annotations: None,
            }
        }

        async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
            let text = arguments["text"].as_str().unwrap_or_default();
            Ok(CallToolResult::text(text.to_uppercase()))
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool)).unwrap();
        McpServer::new(registry)
    }

    async fn call(server: &McpServer, message: Value) -> Value {
        let response = server
            .handle_message(&message.to_string())
            .await
            .expect("request should be answered");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }
            }),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_notification_not_answered() {
        let server = server();

        let raw = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(raw.is_none());

        let typed = server
            .handle_request(JsonRpcRequest::notification("notifications/cancelled"))
            .await;
        assert!(typed.is_none());

        let ping = server
            .handle_request(JsonRpcRequest::new(9, "ping", None))
            .await
            .unwrap();
        assert_eq!(ping.id, 9);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        )
        .await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "upper");
        assert_eq!(tools[0]["annotations"]["readOnlyHint"], true);
    }

    #[tokio::test]
    async fn test_tools_call() {
        let server = server();

        let ok = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "upper", "arguments": {"text": "hi"}}
            }),
        )
        .await;
        assert_eq!(ok["result"]["content"][0]["text"], "HI");
        assert!(ok["result"].get("isError").is_none());

        let unknown = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "lower", "arguments": {}}
            }),
        )
        .await;
        assert!(unknown.get("error").is_none());
        assert_eq!(unknown["result"]["isError"], true);
        assert_eq!(unknown["result"]["content"][0]["text"], "Error: Unknown tool: lower");

        let missing = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "upper"}
            }),
        )
        .await;
        assert_eq!(missing["result"]["isError"], true);
        assert_eq!(missing["result"]["content"][0]["text"], "Error: Missing arguments");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();

        let unknown = call(&server, json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).await;
        assert_eq!(unknown["error"]["code"], -32601);

        let bad_params = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {"arguments": {}}}),
        )
        .await;
        assert_eq!(bad_params["error"]["code"], -32602);

        let garbage = server.handle_message("{not json").await.unwrap();
        assert_eq!(garbage.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_null_id_is_answered() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": null, "method": "ping"}),
        )
        .await;

        assert!(response.as_object().unwrap().contains_key("id"));
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_serve_answers_in_order() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"upper","arguments":{"text":"ok"}}}"#,
            "\n"
        );
        let mut output = Vec::new();

        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"], json!({}));
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "OK");
    }

    async fn serve_bytes(input: &[u8]) -> Vec<Value> {
        let mut output = Vec::new();
        server().serve(input, &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_vec();
        input.extend_from_slice(b"\n\xff\xfe\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let responses = serve_bytes(&input).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 2);
        assert_eq!(responses[2]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_serve_survives_oversized_line() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_vec();
        input.push(b'\n');
        input.extend(std::iter::repeat(b'x').take(MAX_LINE_BYTES + 10));
        input.push(b'\n');
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let responses = serve_bytes(&input).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], -32600);
        assert_eq!(responses[2]["id"], 2);
        assert_eq!(responses[2]["result"], json!({}));
    }
}
