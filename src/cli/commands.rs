use clap::Subcommand;

use super::batch::BatchArgs;
use super::bpm::BpmArgs;
use super::process::ProcessArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Process a single transaction
    Process(ProcessArgs),

    /// Process every input file in the input directory
    Batch(BatchArgs),

    /// Look a transaction up in BPM without acting on it
    Bpm(BpmArgs),
}
