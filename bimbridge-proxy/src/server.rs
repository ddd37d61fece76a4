//! MCP server over stdio
//!
//! Reads line-delimited JSON-RPC from stdin and writes responses to stdout.
//! Tool calls are forwarded to the bridge's HTTP routes.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::client::RouteClient;
use crate::error::ProxyError;
use crate::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolResult, ToolsListResult,
};
use crate::tools::{get_tool_definitions, required_arguments, route_for_tool};

pub struct ToolProxy {
    client: RouteClient,
    initialized: bool,
}

impl ToolProxy {
    pub fn new(client: RouteClient) -> Self {
        Self {
            client,
            initialized: false,
        }
    }

    /// Serve until stdin closes
    pub async fn run(&mut self) -> Result<(), ProxyError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        info!(
            "Tool proxy starting, routes at {}",
            self.client.config().routes_url
        );

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            if let Some(response) = self.handle_line(&line).await {
                let json = serde_json::to_string(&response)?;
                debug!("Sending: {}", json);
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        info!("Tool proxy shutting down");
        Ok(())
    }

    /// Handle one protocol line; `None` for notifications
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::new(JsonRpcError::PARSE_ERROR, e.to_string()),
                ))
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                JsonRpcError::with_data(
                    JsonRpcError::INVALID_REQUEST,
                    "Invalid JSON-RPC version",
                    json!({"expected": "2.0", "got": request.jsonrpc}),
                ),
            ));
        }

        let notification = request.is_notification();
        let id = request.id.clone().unwrap_or(Value::Null);
        let result = self.handle_request(&request).await;
        if notification {
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e.into()),
        })
    }

    async fn handle_request(&mut self, request: &JsonRpcRequest) -> Result<Value, ProxyError> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "notifications/initialized" | "initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),
            "tools/list" => handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            other => Err(ProxyError::MethodNotFound(other.to_string())),
        }
    }

    fn handle_initialize(&mut self) -> Result<Value, ProxyError> {
        self.initialized = true;
        info!("Tool proxy initialized");
        serde_json::to_value(InitializeResult::default())
            .map_err(|e| ProxyError::Internal(e.to_string()))
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, ProxyError> {
        if !self.initialized {
            return Err(ProxyError::NotInitialized);
        }
        let name = params["name"]
            .as_str()
            .ok_or_else(|| ProxyError::InvalidParams("Missing 'name' parameter".into()))?;
        let arguments = match &params["arguments"] {
            Value::Null => json!({}),
            Value::Object(map) => Value::Object(map.clone()),
            _ => {
                return Err(ProxyError::InvalidParams(
                    "'arguments' must be an object".into(),
                ))
            }
        };

        debug!("Tool call: {} with args: {}", name, arguments);
        let result = self.dispatch_tool(name, &arguments).await?;
        if result.is_error() {
            warn!(tool = name, "tool error: {}", result.first_text().unwrap_or_default());
        }
        serde_json::to_value(result).map_err(|e| ProxyError::Internal(e.to_string()))
    }

    /// Unknown tools and missing arguments are protocol errors; anything
    /// the bridge says comes back as a tool result
    async fn dispatch_tool(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<ToolResult, ProxyError> {
        let route = route_for_tool(name).ok_or_else(|| ProxyError::UnknownTool(name.into()))?;

        for required in required_arguments(name) {
            if arguments.get(&required).map_or(true, Value::is_null) {
                return Err(ProxyError::InvalidParams(format!(
                    "Missing '{}' parameter",
                    required
                )));
            }
        }

        let url = self
            .client
            .url_for(route, arguments)
            .map_err(ProxyError::InvalidParams)?;
        Ok(self.client.call(route, &url, arguments).await)
    }
}

fn handle_tools_list() -> Result<Value, ProxyError> {
    let result = ToolsListResult {
        tools: get_tool_definitions(),
    };
    serde_json::to_value(result).map_err(|e| ProxyError::Internal(e.to_string()))
}
