//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use mock_server::config::{FilterConfig, ResponseConfig, RouteConfig, ServerConfig};
use mock_server::{MockServer, Shutdown};

/// A running mock server bound to an ephemeral port.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<ServerConfig>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server for `config` on 127.0.0.1 with a random port.
pub async fn start_mock_server(mut config: ServerConfig) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = MockServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, updates_rx, server_shutdown).await });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

/// Plain client without proxies or pooling.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn inline_response(id: &str, content: &str, filters: Vec<FilterConfig>) -> ResponseConfig {
    ResponseConfig {
        id: id.into(),
        content: Some(content.into()),
        filters,
        ..ResponseConfig::default()
    }
}

#[allow(dead_code)]
pub fn route(name: &str, method: Option<&str>, path: &str, response: &str) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        method: method.map(Into::into),
        path: Some(path.into()),
        path_prefix: None,
        response: response.into(),
        priority: 0,
    }
}
