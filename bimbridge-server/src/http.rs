//! HTTP route layer
//!
//! Serves the operation routes under `/<api_name>/`, plus `/health` and the
//! Prometheus `/metrics` endpoint. Each request is turned into a bridge call;
//! the handler never touches the document itself.

use std::convert::Infallible;
use std::sync::Arc;

use bimbridge_protocol::{match_route, HttpMethod};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::bridge::{BridgeClient, OpError};
use crate::observability::{GaugeSnapshot, Metrics};

/// Shared state for request handlers
pub struct HttpState {
    pub bridge: BridgeClient,
    /// Routes live under `/<api_name>`
    pub api_name: String,
    pub metrics_enabled: bool,
}

impl HttpState {
    pub fn new(bridge: BridgeClient, api_name: impl Into<String>) -> Self {
        Self {
            bridge,
            api_name: api_name.into(),
            metrics_enabled: true,
        }
    }
}

/// Serve HTTP on `listener` until a shutdown message arrives
pub async fn run_http_server(
    listener: TcpListener,
    state: Arc<HttpState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    match listener.local_addr() {
        Ok(addr) => info!("Routes available at http://{}/{}/", addr, state.api_name),
        Err(e) => warn!("Listener has no local address: {}", e),
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                let (stream, remote_addr) = match accept_result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("HTTP accept error: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let state_clone = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state_clone);
                        async move { handle_request(req, state).await }
                    });

                    if let Err(e) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        // Connection errors are expected when clients disconnect
                        if !e.is_incomplete_message() {
                            warn!("HTTP connection error from {}: {}", remote_addr, e);
                        }
                    }
                });
            }

            _ = shutdown_rx.recv() => {
                info!("HTTP server shutting down");
                break;
            }
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<HttpState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (&Method::GET, "/health") => return Ok(serve_health(&state)),
        (&Method::GET, "/metrics") if state.metrics_enabled => return Ok(serve_metrics(&state)),
        _ => {}
    }

    let route_path = match strip_api_prefix(&path, &state.api_name) {
        Some(rest) => rest,
        None => return Ok(unknown_operation()),
    };
    let http_method = match method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        _ => return Ok(unknown_operation()),
    };
    let matched = match match_route(http_method, route_path) {
        Some(m) => m,
        None => {
            debug!("No route for {} {}", method, path);
            return Ok(unknown_operation());
        }
    };

    let body = match read_json_body(req).await {
        Ok(body) => body,
        Err(message) => {
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &OpError::input(message).to_json(),
            ))
        }
    };

    let operation = matched.route.operation;
    let arguments = matched.merge_params(body);
    debug!(op = operation, "{} {}", method, path);

    let response = match state.bridge.call_named(operation, arguments).await {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_response(status, &e.to_json())
        }
    };
    Ok(response)
}

/// Path relative to `/<api_name>`, or `None` outside of it
fn strip_api_prefix<'a>(path: &'a str, api_name: &str) -> Option<&'a str> {
    let rest = path.strip_prefix('/')?.strip_prefix(api_name)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Empty bodies are `null`; anything else must be JSON
async fn read_json_body(req: Request<hyper::body::Incoming>) -> Result<Value, String> {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("Failed to read request body: {}", e))?
        .to_bytes();
    parse_body(&bytes)
}

fn parse_body(bytes: &[u8]) -> Result<Value, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| format!("Invalid JSON body: {}", e))
}

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn json_response(status: StatusCode, value: &Value) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    respond(status, "application/json", Bytes::from(body))
}

fn unknown_operation() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({"ok": false, "error": "unknown operation"}),
    )
}

fn serve_health(state: &HttpState) -> Response<Full<Bytes>> {
    if state.bridge.is_running() {
        respond(StatusCode::OK, "text/plain", Bytes::from_static(b"OK"))
    } else {
        respond(
            StatusCode::SERVICE_UNAVAILABLE,
            "text/plain",
            Bytes::from_static(b"bridge stopped"),
        )
    }
}

fn serve_metrics(state: &HttpState) -> Response<Full<Bytes>> {
    let mut gauges = GaugeSnapshot {
        queued_jobs: state.bridge.queued_jobs() as u64,
        host_running: u64::from(state.bridge.is_running()),
        ..Default::default()
    };
    gauges.collect_process_metrics();

    let body = Metrics::global().to_prometheus(&gauges);
    respond(
        StatusCode::OK,
        "text/plain; version=0.0.4; charset=utf-8",
        Bytes::from(body),
    )
}
