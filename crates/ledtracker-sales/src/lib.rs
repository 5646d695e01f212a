//! # ledtracker-sales
//!
//! Sales data sources.
//!
//! This crate provides:
//! - [`SalesSource`], the seam between the controller and any sales API
//! - [`MockSalesSource`] for development boards without API access
//! - [`HttpSalesClient`] for JSON sales endpoints

pub mod http;
pub mod mock;

pub use http::HttpSalesClient;
pub use mock::MockSalesSource;

use async_trait::async_trait;
use ledtracker_core::SalesSnapshot;
use thiserror::Error;

/// Errors that can occur while fetching sales data.
#[derive(Debug, Error)]
pub enum SalesError {
    /// The request could not be sent or timed out.
    #[error("Request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status.
    #[error("Sales API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a sales document.
    #[error("Invalid sales response: {0}")]
    Decode(String),

    /// Credentials needed for the request are missing or unreadable.
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    /// Raised by [`MockSalesSource`] when configured to fail.
    #[error("Simulated failure: {0}")]
    Simulated(String),
}

/// A source of sales snapshots.
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Fetch the current sales figures.
    async fn fetch(&self) -> Result<SalesSnapshot, SalesError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
