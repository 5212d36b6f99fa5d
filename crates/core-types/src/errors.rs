//! Validation errors for inbound transaction requests

use thiserror::Error;

/// Reasons a request is rejected before any automation begins
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory field was absent or blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Identifier longer than the permitted maximum
    #[error("Transaction identifier is {0} characters long (max {max})", max = crate::IDENTIFIER_MAX_LEN)]
    IdentifierTooLong(usize),

    /// Identifier contains a character outside the permitted alphabet
    #[error("Transaction identifier contains invalid character {0:?}")]
    InvalidIdentifierChar(char),

    /// Action is not one of the four supported dispositions
    #[error("Unknown action '{0}' (expected STP-Release, Release, Block or Reject)")]
    UnknownAction(String),

    /// Comment exceeds the length limit after sanitizing
    #[error("Comment is {0} characters long after sanitizing (max {max})", max = crate::COMMENT_MAX_LEN)]
    CommentTooLong(usize),

    /// Market / transaction type not in the known option set
    #[error("Unknown transaction type '{0}'")]
    UnknownMarket(String),
}
