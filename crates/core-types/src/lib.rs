//! Shared model for the Firco disposition pipeline.
//!
//! Everything that crosses a crate boundary lives here: the validated
//! [`TransactionRequest`], the [`LocationResult`] produced by the locator,
//! the status-marker classification used by the executor's rule table and
//! the terminal [`DispositionOutcome`] returned to callers.

pub mod bpm;
pub mod errors;
pub mod ids;
pub mod location;
pub mod markers;
pub mod outcome;
pub mod request;

pub use bpm::{validate_bpm_row, BpmFinding, BpmRowDetails, BpmRowReport, BpmRowStatus};
pub use errors::ValidationError;
pub use ids::{RequestId, SessionId};
pub use location::{LiveMatch, LocationResult, RowHandle, Surface};
pub use markers::{CurrentStatus, Environment, RawMarkers, StatusMarkers, StatusTag};
pub use outcome::{DispositionOutcome, ErrorKind, NoOpReason, OutcomeTag};
pub use request::{
    Actor, Comment, DispositionAction, MarketType, RawTransactionRequest, TransactionId,
    TransactionRequest, COMMENT_MAX_LEN, IDENTIFIER_MAX_LEN,
};
