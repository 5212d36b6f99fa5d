//! Page navigator contract for Firco disposition automation
//!
//! This crate provides the leaf capability every higher layer drives:
//! - [`PageNavigator`]: click, type, count, read, wait and screenshot on one page
//! - [`BrowserSession`] / [`SessionFactory`]: one isolated session per request
//! - [`WaitPolicy`]: explicit timeouts for every wait point
//! - [`scripted`] (feature `scripted`): an in-memory navigator for tests

pub mod errors;
mod navigator;
mod session;
pub mod types;
mod waiting;

#[cfg(feature = "scripted")]
pub mod scripted;

pub use errors::*;
pub use navigator::*;
pub use session::*;
pub use types::*;
pub use waiting::*;
