//! Raw frame sink for the physical panel.
//!
//! The HUB75 driver on the device exposes a character device (or FIFO) that
//! accepts whole frames: 32 rows x 64 columns x RGB24, row-major, 6144 bytes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use ledtracker_core::FrameBuffer;
use tracing::{debug, info};

use crate::{DisplayError, MatrixBackend};

/// Writes each frame to the panel device node.
#[derive(Debug, Clone)]
pub struct PanelSink {
    device: PathBuf,
}

impl PanelSink {
    pub fn new(device: impl AsRef<Path>) -> Self {
        Self {
            device: device.as_ref().to_path_buf(),
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

impl MatrixBackend for PanelSink {
    fn push(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let bytes = frame.to_rgb24();
        let write = || -> std::io::Result<()> {
            let mut dev = OpenOptions::new().write(true).open(&self.device)?;
            dev.write_all(&bytes)?;
            dev.flush()
        };
        write().map_err(|source| DisplayError::Push {
            backend: "panel",
            source,
        })?;
        debug!("Pushed {} bytes to {}", bytes.len(), self.device.display());
        Ok(())
    }

    fn cleanup(&mut self) {
        info!("Released matrix device {}", self.device.display());
    }

    fn name(&self) -> &'static str {
        "panel"
    }
}
