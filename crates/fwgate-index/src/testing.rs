//! Test utilities for fwgate-index
//!
//! Provides an in-process firmware index served by axum, so the client (and
//! anything built on it) can be exercised against real HTTP round trips.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;

use fwgate_core::{Device, Firmware, HttpOptions, Result};

use crate::MetadataClient;

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: MetadataClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on an ephemeral port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use fwgate_index::testing::{FakeIndex, TestServer};
    ///
    /// let index = FakeIndex::new(devices);
    /// let server = TestServer::start(index.router()).await?;
    /// let catalog = server.client.list_devices().await?;
    /// ```
    pub async fn start(router: Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Serve `router` with custom client timeouts
    pub async fn start_with_timeout(
        router: Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        // Spawn the server
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let options = HttpOptions::default().with_timeouts(timeout, connect_timeout);
        let client = MetadataClient::with_options(&format!("http://{}/", addr), &options)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Synthetic firmware index backed by a fixed catalog snapshot
///
/// Serves the four index routes and records every request path, in order,
/// so tests can assert on call counts and scan order.
#[derive(Clone)]
pub struct FakeIndex {
    devices: Arc<Vec<Device>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeIndex {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Arc::new(devices),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Request paths seen so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Identifiers requested through `/device/{id}`, in arrival order
    pub fn device_lookups(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|p| p.strip_prefix("/device/").map(String::from))
            .collect()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/devices", get(list_devices))
            .route("/device/{id}", get(get_device))
            .route("/ipsw/{version}", get(list_version))
            .route("/ipsw/{id}/{build}", get(get_firmware))
            .with_state(self.clone())
    }

    fn record(&self, path: String) {
        self.requests.lock().push(path);
    }

    fn find(&self, identifier: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.identifier == identifier)
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

async fn list_devices(State(index): State<FakeIndex>) -> Json<Vec<Device>> {
    index.record("/devices".to_string());
    // The catalog listing carries no firmware arrays
    let summaries = index
        .devices
        .iter()
        .map(|d| Device {
            firmwares: Vec::new(),
            ..d.clone()
        })
        .collect();
    Json(summaries)
}

async fn get_device(State(index): State<FakeIndex>, Path(id): Path<String>) -> Response {
    index.record(format!("/device/{}", id));
    match index.find(&id) {
        Some(device) => Json(device.clone()).into_response(),
        None => not_found(),
    }
}

async fn list_version(State(index): State<FakeIndex>, Path(version): Path<String>) -> Response {
    index.record(format!("/ipsw/{}", version));
    let firmwares: Vec<Firmware> = index
        .devices
        .iter()
        .flat_map(|d| d.firmwares.iter())
        .filter(|fw| fw.version == version)
        .cloned()
        .collect();
    Json(firmwares).into_response()
}

async fn get_firmware(
    State(index): State<FakeIndex>,
    Path((id, build)): Path<(String, String)>,
) -> Response {
    index.record(format!("/ipsw/{}/{}", id, build));
    match index.find(&id).and_then(|d| d.firmware_for_build(&build)) {
        Some(fw) => Json(fw.clone()).into_response(),
        None => not_found(),
    }
}
