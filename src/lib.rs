//! Cradle - Ephemeral Sandboxed Process Launcher
//!
//! Prepares an OCI runtime bundle (root filesystem + config.json) in a
//! per-user cache and drives a runc-compatible runtime through a
//! delete-then-create lifecycle for a single fixed container identity.

pub mod assets;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod oci;
pub mod rootfs;
pub mod runtime;

pub use error::{CradleError, CradleResult};

/// The single container identity this tool manages.
pub const CONTAINER_ID: &str = "cradle-sandbox";
