//! Fixed-value sales source.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ledtracker_core::SalesSnapshot;
use tracing::debug;

use crate::{SalesError, SalesSource};

/// Returns the same figures on every fetch, or fails on every fetch.
#[derive(Debug)]
pub struct MockSalesSource {
    sales_today: u64,
    sales_yesterday: u64,
    failure: Option<String>,
    fetches: AtomicU64,
}

impl MockSalesSource {
    /// Default mocked figures: 123 today, 98 yesterday.
    pub fn new() -> Self {
        Self::with_figures(123, 98)
    }

    pub fn with_figures(sales_today: u64, sales_yesterday: u64) -> Self {
        Self {
            sales_today,
            sales_yesterday,
            failure: None,
            fetches: AtomicU64::new(0),
        }
    }

    /// A source whose every fetch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Number of fetches performed so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl Default for MockSalesSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SalesSource for MockSalesSource {
    async fn fetch(&self) -> Result<SalesSnapshot, SalesError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!("Fetching sales data (mocked)");

        if let Some(message) = &self.failure {
            return Err(SalesError::Simulated(message.clone()));
        }
        Ok(SalesSnapshot::now(self.sales_today, self.sales_yesterday))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_figures() {
        let source = MockSalesSource::new();
        let snapshot = source.fetch().await.unwrap();

        assert_eq!(snapshot.sales_today, 123);
        assert_eq!(snapshot.sales_yesterday, 98);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MockSalesSource::failing("api down");

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SalesError::Simulated(ref m) if m == "api down"));
        assert_eq!(source.fetch_count(), 1);
    }
}
