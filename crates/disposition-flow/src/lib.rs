//! Disposition Flow Layer
//!
//! Everything between a validated request and its terminal outcome:
//! - Disposition executor applying the status-marker rule table
//! - Retry/recovery controller owning one browser session per request
//! - Failure classification with bounded exponential backoff
//! - Result reporter shaping outcomes for the HTTP and file layers
//! - Read-only BPM lookup sharing the same retry policy

pub mod controller;
pub mod errors;
pub mod executor;
pub mod lookup;
pub mod metrics;
pub mod reporter;
pub mod strategies;
pub mod types;

pub use controller::RetryController;
pub use errors::FlowError;
pub use executor::{decide, Decision, DispositionExecutor};
pub use lookup::{BpmLookup, BpmLookupRequest, BpmLookupResponse, BpmLookupResults};
pub use reporter::{receipt, report, DispositionReport, NOT_FOUND_CODE};
pub use strategies::{FailureClass, RetryPolicy, DEFAULT_RELOAD_SIGNATURES};
pub use types::{Actors, RetryPhase, RetryState, RunReport};
