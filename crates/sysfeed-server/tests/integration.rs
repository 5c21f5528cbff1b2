//! End-to-end tests using a real WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use futures::{SinkExt, StreamExt};
use sysfeed_core::{Payload, SnapshotSource, SourceError, UpdateKind};
use sysfeed_server::config::ServerConfig;
use sysfeed_server::server::SysfeedServer;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot a test server on an ephemeral port.
async fn boot_server(config: ServerConfig) -> (std::net::SocketAddr, Arc<SysfeedServer>) {
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    let server = Arc::new(SysfeedServer::new(config, metrics_handle));
    let (addr, _handle) = server.listen().await.unwrap();
    (addr, server)
}

async fn connect(addr: std::net::SocketAddr) -> WsStream {
    let (ws, _resp) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Wait until the registry holds `n` subscribers.
async fn wait_for_subscribers(server: &SysfeedServer, n: usize) {
    timeout(TIMEOUT, async {
        while server.registry().len() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} subscribers, have {}", server.registry().len()));
}

async fn next_text(ws: &mut WsStream) -> String {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("read error");
        if let Message::Text(text) = msg {
            return text.to_string();
        }
    }
}

struct StaticSource;

#[async_trait]
impl SnapshotSource for StaticSource {
    async fn system_section(&self) -> Result<String, SourceError> {
        Ok("<div id=\"system-data\">sys</div>".into())
    }

    async fn disk_section(&self) -> Result<String, SourceError> {
        Err(SourceError::Collect {
            section: UpdateKind::DiskData,
            reason: "statfs failed".into(),
        })
    }

    async fn cpu_section(&self) -> Result<String, SourceError> {
        Ok("<div id=\"cpu-data\">cpu</div>".into())
    }

    fn timestamp_section(&self, _now: DateTime<Local>) -> String {
        "<div id=\"update-timestamp\">now</div>".into()
    }
}

#[tokio::test]
async fn every_subscriber_receives_broadcast() {
    let (addr, server) = boot_server(ServerConfig::default()).await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(connect(addr).await);
    }
    wait_for_subscribers(&server, 3).await;

    let report = server
        .broadcaster()
        .publish(Payload::from("UPDATE_TIMESTAMP:2024-01-01 00:00:00"));
    assert_eq!(report.delivered, 3);

    for ws in &mut clients {
        assert_eq!(next_text(ws).await, "UPDATE_TIMESTAMP:2024-01-01 00:00:00");
    }
}

#[tokio::test]
async fn messages_arrive_in_publish_order() {
    let (addr, server) = boot_server(ServerConfig::default()).await;
    let mut ws = connect(addr).await;
    wait_for_subscribers(&server, 1).await;

    for p in ["p1", "p2", "p3"] {
        let _ = server.broadcaster().publish(Payload::from(p));
    }
    for p in ["p1", "p2", "p3"] {
        assert_eq!(next_text(&mut ws).await, p);
    }
}

#[tokio::test]
async fn client_close_unregisters_subscriber() {
    let (addr, server) = boot_server(ServerConfig::default()).await;
    let mut ws = connect(addr).await;
    let _other = connect(addr).await;
    wait_for_subscribers(&server, 2).await;

    ws.close(None).await.unwrap();
    wait_for_subscribers(&server, 1).await;

    let report = server.broadcaster().publish(Payload::from("after"));
    assert_eq!(report.delivered, 1);
}

#[tokio::test]
async fn publisher_pushes_tagged_sections_and_skips_failures() {
    let (addr, server) = boot_server(ServerConfig {
        publish_interval: Duration::from_secs(60),
        ..ServerConfig::default()
    })
    .await;
    let mut ws = connect(addr).await;
    wait_for_subscribers(&server, 1).await;

    let _publisher = server.spawn_publisher(Arc::new(StaticSource));

    let mut tags = Vec::new();
    for _ in 0..3 {
        let text = next_text(&mut ws).await;
        let payload = Payload::from(text);
        let (kind, _) = payload.split().unwrap();
        tags.push(kind);
    }
    assert_eq!(
        tags,
        [UpdateKind::Timestamp, UpdateKind::SystemData, UpdateKind::CpuData]
    );
}

#[tokio::test]
async fn health_and_metrics_over_http() {
    let (addr, server) = boot_server(ServerConfig::default()).await;
    let _ws = connect(addr).await;
    wait_for_subscribers(&server, 1).await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscribers"], 1);

    let resp = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn shutdown_closes_open_sockets() {
    let (addr, server) = boot_server(ServerConfig::default()).await;
    let mut ws = connect(addr).await;
    wait_for_subscribers(&server, 1).await;

    server.shutdown().shutdown();

    let ended = timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_) | Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "socket still open after shutdown");
    wait_for_subscribers(&server, 0).await;
}
