//! # ledtracker-web
//!
//! HTTP front door of the LED sales tracker.
//!
//! This crate provides:
//! - The captive-portal setup endpoints (`/setup`)
//! - A manual trigger for a matrix refresh (`/update-matrix`)
//! - A JSON status document (`/status`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledtracker_web::{create_router, ServerState};
//!
//! let state = Arc::new(ServerState::new(controller, credentials));
//! let app = create_router(state);
//!
//! let listener = TcpListener::bind("0.0.0.0:80").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod routes;

// Re-exports
pub use routes::create_router;

use std::sync::Arc;

use ledtracker_controller::Controller;
use ledtracker_core::CredentialStore;
use ledtracker_network::NetworkConfigurator;

/// Shared server state for all route handlers.
pub struct ServerState {
    /// Fetch-and-render pipeline.
    pub controller: Arc<Controller>,

    /// Where portal-submitted credentials are kept.
    pub credentials: Arc<dyn CredentialStore>,

    /// Applies Wi-Fi credentials; `None` leaves networking untouched.
    pub network: Option<Arc<NetworkConfigurator>>,
}

impl ServerState {
    /// Create server state without network reconfiguration.
    pub fn new(controller: Arc<Controller>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            controller,
            credentials,
            network: None,
        }
    }

    /// Apply saved Wi-Fi credentials through `network`.
    pub fn with_network(mut self, network: NetworkConfigurator) -> Self {
        self.network = Some(Arc::new(network));
        self
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<ServerState>;
