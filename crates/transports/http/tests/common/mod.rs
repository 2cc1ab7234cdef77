//! Embedded relay for integration tests

#![allow(dead_code)]

use sigrelay_core::{SdpType, SessionStore};
use sigrelay_http::{RelayServer, RelayServerConfig, SignalingConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Poll interval used by test clients
pub const FAST_POLL: Duration = Duration::from_millis(15);

/// Relay bound to a random local port, stopped on drop
pub struct TestRelay {
    addr: SocketAddr,
    store: Arc<SessionStore>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: tokio::task::JoinHandle<()>,
}

impl TestRelay {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let store = Arc::new(SessionStore::new());
        let server = RelayServer::with_store(
            RelayServerConfig::new(addr.to_string()),
            Arc::clone(&store),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.serve_listener(listener, shutdown).await {
                tracing::error!("Test relay failed: {}", e);
            }
        });

        Self {
            addr,
            store,
            shutdown_tx: Some(shutdown_tx),
            server_handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn session_url(&self, session_id: &str) -> String {
        format!("{}/signaling/{}", self.base_url(), session_id)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Client config polling this relay quickly
    pub fn client_config(&self, session_id: &str, role: SdpType) -> SignalingConfig {
        SignalingConfig::new(self.base_url(), session_id, role).with_poll_interval(FAST_POLL)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.server_handle).await;
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
