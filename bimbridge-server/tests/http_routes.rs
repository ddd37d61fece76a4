//! Route layer against a live listener and a real document host

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use bimbridge_server::bridge::{BridgeConfig, BridgeContext, BridgeHandle};
use bimbridge_server::http::{run_http_server, HttpState};
use bimbridge_server::{Document, DocumentHost};

struct TestServer {
    addr: SocketAddr,
    bridge: BridgeHandle<DocumentHost>,
    shutdown_tx: broadcast::Sender<()>,
    http: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let host = DocumentHost::new(Document::starter("HTTP Test"));
        let bridge = BridgeContext::start(host, BridgeConfig::default()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(HttpState::new(bridge.client(), "bimbridge"));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(run_http_server(listener, state, shutdown_rx));

        Self {
            addr,
            bridge,
            shutdown_tx,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.http.get(self.url(path)).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self.http.post(self.url(path)).json(&body).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    fn stop(self) -> DocumentHost {
        let _ = self.shutdown_tx.send(());
        self.bridge.stop().unwrap()
    }
}

#[tokio::test]
async fn test_status_route() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/bimbridge/status/").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "active");
    assert_eq!(body["document_title"], "HTTP Test");
    assert_eq!(body["api_name"], "bimbridge");
    server.stop();
}

#[tokio::test]
async fn test_trailing_slash_is_optional() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/bimbridge/levels").await;
    assert_eq!(status, 200);
    assert_eq!(body["levels"].as_array().unwrap().len(), 2);
    server.stop();
}

#[tokio::test]
async fn test_create_wall_then_quantify() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "/bimbridge/create_wall_line/",
            json!({"x1": 0.0, "y1": 0.0, "x2": 20.0, "y2": 0.0}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    assert!(body["elementId"].is_i64());

    let (status, body) = server.get("/bimbridge/quantify/walls/").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_walls"], 1);

    let host = server.stop();
    assert_eq!(host.document().transaction_count(), 1);
}

#[tokio::test]
async fn test_input_error_status() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "/bimbridge/create_wall_line/",
            json!({"x1": 1.0, "y1": 1.0, "x2": 1.0, "y2": 1.0}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
    server.stop();
}

#[tokio::test]
async fn test_validation_is_a_success_response() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "/bimbridge/validate/place_column/",
            json!({"x": 0.0, "y": 0.0, "level": "Level 9"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["canPlace"], false);
    assert!(body["reason"].is_string());
    server.stop();
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/bimbridge/summon_building/").await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"ok": false, "error": "unknown operation"}));

    // wrong method on a known path
    let (status, _) = server.get("/bimbridge/create_wall_line/").await;
    assert_eq!(status, 404);

    let (status, _) = server.get("/elsewhere/status/").await;
    assert_eq!(status, 404);
    server.stop();
}

#[tokio::test]
async fn test_malformed_json_body() {
    let server = TestServer::start().await;
    let response = server
        .http
        .post(server.url("/bimbridge/create_wall_line/"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);

    let host = server.stop();
    assert_eq!(host.document().transaction_count(), 0);
}

#[tokio::test]
async fn test_family_path_parameters() {
    let server = TestServer::start().await;
    let (_, families) = server.get("/bimbridge/families/").await;
    let family_id = families["families"][0]["id"].as_i64().unwrap();

    let (status, body) = server
        .get(&format!("/bimbridge/families/{}/symbols/", family_id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["familyId"], family_id);

    let inactive = body["symbols"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["isActive"] == false)
        .map(|s| s["id"].as_i64().unwrap())
        .unwrap();
    let (status, body) = server
        .post(
            &format!("/bimbridge/families/symbols/{}/activate/", inactive),
            Value::Null,
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["isActive"], true);

    let (status, _) = server.get("/bimbridge/families/999999/symbols/").await;
    assert_eq!(status, 404);
    server.stop();
}

#[tokio::test]
async fn test_health_and_metrics() {
    let server = TestServer::start().await;
    server.get("/bimbridge/status/").await;

    let health = server.http.get(server.url("/health")).send().await.unwrap();
    assert_eq!(health.status().as_u16(), 200);

    let metrics = server
        .http
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("bimbridge_"));
    server.stop();
}
