//! Browser session lifecycle

use async_trait::async_trait;

use crate::errors::NavResult;
use crate::navigator::PageNavigator;
use crate::types::SessionScope;

/// One isolated browser context owned by a single request
#[async_trait]
pub trait BrowserSession: Send {
    fn navigator(&mut self) -> &mut dyn PageNavigator;

    /// Replace the page with a fresh one; login state is lost
    async fn reset(&mut self) -> NavResult<()>;

    /// Release every browser resource held by the session
    async fn close(self: Box<Self>) -> NavResult<()>;
}

/// Opens sessions; shared by all concurrent requests
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, scope: &SessionScope) -> NavResult<Box<dyn BrowserSession>>;
}
