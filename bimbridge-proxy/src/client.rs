//! HTTP client for the bridge routes
//!
//! Stateless apart from the base URL and timeouts; never retries.

use std::time::Duration;

use bimbridge_protocol::{HttpMethod, RouteSpec};
use bimbridge_utils::{BridgeError, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::ToolResult;

pub const DEFAULT_ROUTES_URL: &str = "http://127.0.0.1:48884/bimbridge";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the api name, e.g. `http://127.0.0.1:48884/bimbridge`
    pub routes_url: String,
    pub get_timeout: Duration,
    pub post_timeout: Duration,
    pub connect_timeout: Duration,
}

pub struct RouteClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RouteClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BridgeError::connection(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for `route` with path parameters taken from `arguments`
    pub fn url_for(
        &self,
        route: &RouteSpec,
        arguments: &Value,
    ) -> std::result::Result<String, String> {
        let path = route
            .render(arguments)
            .map_err(|name| format!("Missing or invalid '{}' parameter", name))?;
        Ok(format!("{}{}", self.config.routes_url.trim_end_matches('/'), path))
    }

    /// Call the route and turn the response into a tool result
    ///
    /// `url` comes from [`RouteClient::url_for`].
    pub async fn call(&self, route: &RouteSpec, url: &str, arguments: &Value) -> ToolResult {
        let request = match route.method {
            HttpMethod::Get => self.http.get(url).timeout(self.config.get_timeout),
            HttpMethod::Post => self
                .http
                .post(url)
                .timeout(self.config.post_timeout)
                .json(&body_without_path_params(route, arguments)),
        };
        debug!(op = route.operation, "{} {}", route.method, url);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(op = route.operation, "request to {} failed: {}", url, e);
                return ToolResult::error(transport_error(url, &e));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(op = route.operation, "reading response from {} failed: {}", url, e);
                return ToolResult::error(transport_error(url, &e));
            }
        };
        into_tool_result(status.as_u16(), &text)
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> String {
    let what = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    format!("Request to {} {}: {}", url, what, err)
}

/// Path parameters travel in the URL, everything else in the body
fn body_without_path_params(route: &RouteSpec, arguments: &Value) -> Value {
    match arguments {
        Value::Object(map) => {
            let mut map = map.clone();
            for param in route.params() {
                map.remove(param);
            }
            Value::Object(map)
        }
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    }
}

/// 2xx JSON becomes pretty text; a non-2xx JSON body is passed through
/// verbatim as a tool error
fn into_tool_result(status: u16, body: &str) -> ToolResult {
    let json = serde_json::from_str::<Value>(body).ok();
    let success = (200..300).contains(&status);

    match (success, json) {
        (true, Some(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => ToolResult::text(text),
            Err(_) => ToolResult::text(body),
        },
        (true, None) => ToolResult::text(body),
        (false, Some(_)) => ToolResult::error(body),
        (false, None) => ToolResult::error(format!("HTTP {}: {}", status, body)),
    }
}
