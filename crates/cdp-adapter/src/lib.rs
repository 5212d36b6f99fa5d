//! Chromium DevTools Protocol page navigator.
//!
//! Drives Chromium through `chromiumoxide`. Every request gets its own
//! session: a freshly launched browser, or a fresh page on a remote DevTools
//! endpoint when one is configured.

mod config;
pub mod metrics;
mod navigator;
mod script;
mod session;

pub use config::CdpConfig;
pub use navigator::CdpNavigator;
pub use session::{CdpSession, CdpSessionFactory};
