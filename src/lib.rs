//! Firco disposition automation
//!
//! Application layer over the workspace crates: configuration, the HTTP
//! API, the file entry point and the CLI.

pub mod batch;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod output;
pub mod server;
pub mod service;

pub use config::Config;
pub use service::{DispositionService, Processed};
