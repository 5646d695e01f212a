//! # ledtracker-core
//!
//! Core data model and storage for the LED sales tracker.
//!
//! This crate provides:
//! - Data model types (Credentials, SalesSnapshot)
//! - Credential storage abstraction with an env-file implementation
//! - Device configuration loaded from the environment
//! - RGB frame buffer, 5x7 font and the sales headline layout
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! so the same types can be reused by any front end driving the matrix.

pub mod config;
pub mod font;
pub mod matrix;
pub mod model;

pub use config::{
    ConfigError, CredentialStore, DeviceConfig, EnvFileStore, MemoryCredentialStore,
};
pub use matrix::{FrameBuffer, Rgb, COLS, ROWS};
pub use model::*;
