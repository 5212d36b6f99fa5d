pub mod app;
mod batch;
mod bpm;
mod commands;
mod context;
mod dispatch;
mod env;
mod output;
mod process;
mod runtime;
mod serve;

pub use env::CliArgs;
pub use runtime::{load_config, load_local_env_overrides, LoadedConfig};
