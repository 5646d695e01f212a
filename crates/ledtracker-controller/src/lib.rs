//! # ledtracker-controller
//!
//! Ties a sales source to the matrix display.
//!
//! One [`Controller`] is shared (behind an `Arc`) by the HTTP front door and
//! the periodic refresh loop. Each update fetches a snapshot and pushes the
//! rendered headline; the display mutex is held for the whole update so
//! frames from concurrent triggers never interleave and the newest fetch is
//! always the one left on the panel.

pub mod statistics;

pub use statistics::{StatisticsCollector, UpdateStatistics};

use std::sync::Arc;
use std::time::Duration;

use ledtracker_core::SalesSnapshot;
use ledtracker_display::{DisplayError, MatrixDisplay};
use ledtracker_sales::{SalesError, SalesSource};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Why a matrix update failed.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Failed to fetch sales data: {0}")]
    Fetch(#[from] SalesError),

    #[error("Failed to render sales data: {0}")]
    Display(#[from] DisplayError),
}

/// Fetch-and-render pipeline.
pub struct Controller {
    sales: Arc<dyn SalesSource>,
    display: Mutex<MatrixDisplay>,
    last_snapshot: RwLock<Option<SalesSnapshot>>,
    statistics: StatisticsCollector,
}

impl Controller {
    pub fn new(sales: Arc<dyn SalesSource>, display: MatrixDisplay) -> Self {
        Self {
            sales,
            display: Mutex::new(display),
            last_snapshot: RwLock::new(None),
            statistics: StatisticsCollector::new(),
        }
    }

    /// Fetch the latest figures and show them on the matrix.
    pub async fn update_matrix(&self) -> Result<SalesSnapshot, UpdateError> {
        let mut guard = self.display.lock().await;

        let result = async {
            let snapshot = self.sales.fetch().await?;
            guard.show_snapshot(&snapshot)?;
            Ok::<_, UpdateError>(snapshot)
        }
        .await;

        match result {
            Ok(snapshot) => {
                let backend = guard.backend_name();
                debug!("Matrix shows '{}' via {}", snapshot.headline(), backend);
                *self.last_snapshot.write().await = Some(snapshot.clone());
                self.statistics.record_success();
                Ok(snapshot)
            }
            Err(e) => {
                self.statistics.record_failure();
                Err(e)
            }
        }
    }

    /// Update the matrix every `period`, starting immediately.
    ///
    /// Failures are logged and the loop carries on. Runs until the task is
    /// dropped or aborted.
    pub async fn run_refresh_loop(self: Arc<Self>, period: Duration) {
        info!(
            "Refreshing matrix every {}s from '{}' source",
            period.as_secs(),
            self.sales.name()
        );
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let Err(e) = self.update_matrix().await {
                error!("Periodic matrix update failed: {}", e);
            }
        }
    }

    /// Most recent snapshot shown on the matrix.
    pub async fn last_snapshot(&self) -> Option<SalesSnapshot> {
        self.last_snapshot.read().await.clone()
    }

    pub fn statistics(&self) -> UpdateStatistics {
        self.statistics.snapshot()
    }

    pub fn sales_source_name(&self) -> &str {
        self.sales.name()
    }

    /// Blank the matrix and release the backend.
    pub async fn shutdown_display(&self) {
        info!("Cleaning up display");
        self.display.lock().await.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledtracker_core::FrameBuffer;
    use ledtracker_display::MatrixBackend;
    use ledtracker_sales::MockSalesSource;
    use std::sync::Mutex as StdMutex;

    #[derive(Clone, Default)]
    struct RecordingBackend {
        frames: Arc<StdMutex<Vec<FrameBuffer>>>,
        fail: bool,
    }

    impl MatrixBackend for RecordingBackend {
        fn push(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
            if self.fail {
                return Err(DisplayError::Push {
                    backend: "recording",
                    source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
                });
            }
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn controller(sales: Arc<dyn SalesSource>, backend: RecordingBackend) -> Arc<Controller> {
        Arc::new(Controller::new(sales, MatrixDisplay::new(Box::new(backend))))
    }

    #[tokio::test]
    async fn test_update_success() {
        let backend = RecordingBackend::default();
        let frames = backend.frames.clone();
        let controller = controller(Arc::new(MockSalesSource::new()), backend);

        let snapshot = controller.update_matrix().await.unwrap();

        assert_eq!(snapshot.headline(), "T:123 Y:98");
        assert_eq!(frames.lock().unwrap().len(), 1);
        assert!(frames.lock().unwrap()[0].lit_count() > 0);
        assert_eq!(controller.last_snapshot().await, Some(snapshot));
        assert_eq!(controller.statistics().matrix_updates, 1);
        assert_eq!(controller.statistics().failed_updates, 0);
    }

    #[tokio::test]
    async fn test_update_fetch_failure() {
        let backend = RecordingBackend::default();
        let frames = backend.frames.clone();
        let controller = controller(Arc::new(MockSalesSource::failing("offline")), backend);

        let err = controller.update_matrix().await.unwrap_err();

        assert!(matches!(err, UpdateError::Fetch(_)));
        assert!(frames.lock().unwrap().is_empty());
        assert_eq!(controller.last_snapshot().await, None);
        assert_eq!(controller.statistics().failed_updates, 1);
    }

    #[tokio::test]
    async fn test_update_display_failure() {
        let backend = RecordingBackend {
            fail: true,
            ..Default::default()
        };
        let controller = controller(Arc::new(MockSalesSource::new()), backend);

        let err = controller.update_matrix().await.unwrap_err();

        assert!(matches!(err, UpdateError::Display(_)));
        assert_eq!(controller.last_snapshot().await, None);
        assert_eq!(controller.statistics().failed_updates, 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let backend = RecordingBackend::default();
        let frames = backend.frames.clone();
        let controller = controller(Arc::new(MockSalesSource::new()), backend);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let controller = controller.clone();
                tokio::spawn(async move { controller.update_matrix().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(frames.lock().unwrap().len(), 8);
        assert_eq!(controller.statistics().matrix_updates, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_ticks() {
        let source = Arc::new(MockSalesSource::new());
        let controller = controller(source.clone(), RecordingBackend::default());

        let handle = tokio::spawn(controller.clone().run_refresh_loop(Duration::from_secs(60)));

        // ticks at 0s, 60s and 120s
        tokio::time::sleep(Duration::from_secs(125)).await;
        handle.abort();

        assert_eq!(source.fetch_count(), 3);
        assert_eq!(controller.statistics().matrix_updates, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_survives_failures() {
        let source = Arc::new(MockSalesSource::failing("offline"));
        let controller = controller(source.clone(), RecordingBackend::default());

        let handle = tokio::spawn(controller.clone().run_refresh_loop(Duration::from_secs(10)));
        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.abort();

        assert_eq!(source.fetch_count(), 3);
        assert_eq!(controller.statistics().failed_updates, 3);
    }

    #[tokio::test]
    async fn test_shutdown_blanks_display() {
        let backend = RecordingBackend::default();
        let frames = backend.frames.clone();
        let controller = controller(Arc::new(MockSalesSource::new()), backend);

        controller.update_matrix().await.unwrap();
        controller.shutdown_display().await;

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].lit_count(), 0);
    }
}
