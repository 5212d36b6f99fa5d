//! Transaction Locator - finds where a Firco transaction currently lives
//!
//! This crate implements lookup and the page objects it drives:
//! - Firco live messages (single match, or latest of several on request)
//! - History and Sanctions Bypass views (read-only presence checks)
//! - BPM tracker fallback (row extraction and verdict)
//! - Configurable selector catalogues for both applications

pub mod bpm;
pub mod errors;
pub mod firco;
pub mod locator;
pub mod selectors;

#[cfg(any(test, feature = "scripted"))]
pub mod fixtures;

pub use bpm::*;
pub use errors::*;
pub use firco::*;
pub use locator::*;
pub use selectors::*;
