//! Page navigator contract
//!
//! Selectors are CSS by default. Two prefixes are understood by every
//! implementation: `text=<label>` matches elements whose trimmed text equals
//! the label, `xpath=<expr>` evaluates an XPath expression.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::NavResult;

/// Element state awaited by [`PageNavigator::wait_for`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    /// Present in the DOM
    Attached,
    /// Present and rendered
    #[default]
    Visible,
    /// Absent or not rendered
    Hidden,
    /// Absent from the DOM
    Detached,
}

/// Capability-based operations on one page of an automated browser.
///
/// A navigator belongs to exactly one request; every operation completes
/// before the next is issued, so methods take `&mut self`.
#[async_trait]
pub trait PageNavigator: Send {
    /// Navigate to a URL and wait for the load event
    async fn goto(&mut self, url: &str) -> NavResult<()>;

    /// Click the first element matching `selector`
    async fn click(&mut self, selector: &str) -> NavResult<()>;

    /// Click the `index`-th (0-based) element matching `selector`
    async fn click_nth(&mut self, selector: &str, index: usize) -> NavResult<()>;

    /// Replace the value of an input
    async fn fill(&mut self, selector: &str, value: &str) -> NavResult<()>;

    /// Number of elements matching `selector`
    async fn count(&mut self, selector: &str) -> NavResult<usize>;

    async fn is_visible(&mut self, selector: &str) -> NavResult<bool>;

    /// Text of the first match, `None` when nothing matches
    async fn text(&mut self, selector: &str) -> NavResult<Option<String>>;

    /// Text of every match, in document order
    async fn texts(&mut self, selector: &str) -> NavResult<Vec<String>>;

    /// Texts of `child` elements inside the `index`-th `parent` match
    async fn child_texts(
        &mut self,
        parent: &str,
        index: usize,
        child: &str,
    ) -> NavResult<Vec<String>>;

    /// Wait until `selector` reaches `state`, failing with
    /// [`crate::NavError::Timeout`] after `timeout`
    async fn wait_for(
        &mut self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> NavResult<()>;

    /// Wait for the document to finish loading
    async fn wait_for_load(&mut self, timeout: Duration) -> NavResult<()>;

    /// Fixed settle delay for surfaces that re-render after an action
    async fn pause(&mut self, duration: Duration);

    /// Capture a named PNG screenshot and return where it was written
    async fn screenshot(&mut self, name: &str) -> NavResult<PathBuf>;

    async fn current_url(&mut self) -> NavResult<String>;
}
