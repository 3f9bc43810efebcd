//! labscan-gw library interface
//!
//! Scan gateway for laboratory storage barcodes: debounces scanner input,
//! submits accepted barcodes to the upstream location resolver, and drives
//! per-session visual feedback. Exposed as a library for integration testing.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use labscan_common::events::{EventBus, ScanEvent};
use services::{LocationResolver, ScanSession, ScanTimings, ScanValidator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Open scan sessions by id
    pub sessions: Arc<RwLock<HashMap<Uuid, ScanSession>>>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Shared validator in front of the upstream resolver
    pub validator: Arc<ScanValidator>,
    /// Pipeline timing knobs applied to new sessions
    pub timings: ScanTimings,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        event_bus: EventBus,
        resolver: Arc<dyn LocationResolver>,
        timings: ScanTimings,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            event_bus,
            validator: Arc::new(ScanValidator::new(resolver)),
            timings,
            startup_time: Utc::now(),
        }
    }

    /// Open a new scan session and register it
    pub async fn create_session(&self) -> ScanSession {
        let id = Uuid::new_v4();
        let session = ScanSession::new(
            id,
            self.timings,
            self.event_bus.clone(),
            Arc::clone(&self.validator),
        );
        self.sessions.write().await.insert(id, session.clone());
        tracing::info!(session_id = %id, "Scan session opened");
        session
    }

    /// Look up an open session
    pub async fn session(&self, id: &Uuid) -> Option<ScanSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Close a session, aborting its timers. Returns false if unknown.
    pub async fn close_session(&self, id: &Uuid) -> bool {
        let session = self.sessions.write().await.remove(id);
        match session {
            Some(session) => {
                session.shutdown().await;
                self.event_bus.emit_lossy(ScanEvent::SessionClosed {
                    session_id: *id,
                    timestamp: Utc::now(),
                });
                tracing::info!(session_id = %id, "Scan session closed");
                true
            }
            None => false,
        }
    }

    /// Number of open sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::session_routes())
        .merge(api::health_routes())
        .route("/api/events", get(api::event_stream))
        .with_state(state)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
