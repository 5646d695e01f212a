//! # ledtracker-display
//!
//! Display backends for the 64x32 LED matrix.
//!
//! Drawing happens on a [`FrameBuffer`]; a [`MatrixBackend`] only knows how
//! to show a finished frame:
//!
//! - [`PanelSink`] streams raw RGB24 frames to the panel driver's device node
//! - [`TerminalEmulator`] paints the frame in a terminal for development
//!
//! [`select_backend`] picks one from the `DISPLAY_BACKEND` setting.

pub mod emulator;
pub mod panel;

pub use emulator::{render_ascii, TerminalEmulator};
pub use panel::PanelSink;

use std::path::Path;
use std::str::FromStr;

use ledtracker_core::matrix::render_snapshot;
use ledtracker_core::{FrameBuffer, Rgb, SalesSnapshot};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised by display backends.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Writing a frame to the output failed.
    #[error("Failed to push frame to {backend}: {source}")]
    Push {
        backend: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can show a complete frame.
pub trait MatrixBackend: Send {
    /// Show `frame`.
    fn push(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;

    /// Release the output. Called once on shutdown.
    fn cleanup(&mut self) {}

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Which backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Real panel on a Raspberry Pi, emulator elsewhere.
    Auto,
    /// Force the physical panel.
    Real,
    /// Force the terminal emulator.
    Emulator,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "real" => Ok(Self::Real),
            "emu" | "emulator" => Ok(Self::Emulator),
            other => Err(format!("unknown display backend '{}'", other)),
        }
    }
}

impl BackendKind {
    /// Parse a setting value, falling back to `Auto` on unknown input.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|e| {
            warn!("{}, using auto", e);
            Self::Auto
        })
    }

    /// Resolve `Auto` for a given OS / CPU architecture pair.
    pub fn resolve(self, os: &str, arch: &str) -> Self {
        match self {
            Self::Auto if os == "linux" && (arch.starts_with("arm") || arch == "aarch64") => {
                Self::Real
            }
            Self::Auto => Self::Emulator,
            other => other,
        }
    }
}

/// Create the backend for `kind` on the current platform.
pub fn select_backend(kind: BackendKind, matrix_device: &Path) -> Box<dyn MatrixBackend> {
    let resolved = kind.resolve(std::env::consts::OS, std::env::consts::ARCH);
    match (kind, resolved) {
        (BackendKind::Real, _) => info!("Display backend forced to REAL"),
        (BackendKind::Emulator, _) => info!("Display backend forced to EMULATOR"),
        (BackendKind::Auto, BackendKind::Real) => {
            info!("Auto-detected Raspberry Pi, using real matrix")
        }
        (BackendKind::Auto, _) => info!("Using emulator (non-Pi platform)"),
    }

    match resolved {
        BackendKind::Real => Box::new(PanelSink::new(matrix_device)),
        _ => Box::new(TerminalEmulator::stdout()),
    }
}

/// A frame buffer bound to one backend.
pub struct MatrixDisplay {
    frame: FrameBuffer,
    backend: Box<dyn MatrixBackend>,
}

impl MatrixDisplay {
    pub fn new(backend: Box<dyn MatrixBackend>) -> Self {
        Self {
            frame: FrameBuffer::new(),
            backend,
        }
    }

    /// Draw the sales headline and push it.
    pub fn show_snapshot(&mut self, snapshot: &SalesSnapshot) -> Result<(), DisplayError> {
        render_snapshot(&mut self.frame, snapshot);
        self.backend.push(&self.frame)
    }

    /// Blank the panel.
    pub fn blank(&mut self) -> Result<(), DisplayError> {
        self.frame.clear(Rgb::BLACK);
        self.backend.push(&self.frame)
    }

    /// Blank the panel and release the backend.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.blank() {
            warn!("Failed to blank display on shutdown: {}", e);
        }
        self.backend.cleanup();
    }

    /// The last frame drawn.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records pushed frames.
    #[derive(Clone, Default)]
    pub struct RecordingBackend {
        pub frames: Arc<Mutex<Vec<FrameBuffer>>>,
        pub cleaned_up: Arc<Mutex<bool>>,
    }

    impl MatrixBackend for RecordingBackend {
        fn push(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn cleanup(&mut self) {
            *self.cleaned_up.lock().unwrap() = true;
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }
}
