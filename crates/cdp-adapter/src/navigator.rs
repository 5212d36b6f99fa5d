//! [`PageNavigator`] over a chromiumoxide page

use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use action_primitives::{poll_until, NavError, NavResult, PageNavigator, WaitPolicy, WaitState};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{metrics, script};

/// Protocol messages Chromium sends while a frame is torn down mid-call
const CONTEXT_LOST: &[&str] = &[
    "execution context was destroyed",
    "cannot find context with specified id",
    "frame was detached",
    "inspected target navigated or closed",
];

fn is_context_lost(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    CONTEXT_LOST.iter().any(|needle| message.contains(needle))
}

/// The page re-rendered mid-check; polling carries on
fn is_page_reloading(err: &NavError) -> bool {
    matches!(err, NavError::Interaction(message) if is_context_lost(message))
}

pub(crate) fn map_cdp_error(context: &str, err: CdpError) -> NavError {
    let hint = format!("{}: {}", context, err);
    match err {
        CdpError::Timeout => NavError::Timeout(hint),
        CdpError::NotFound => NavError::NotFound(hint),
        CdpError::JavascriptException(_) => NavError::Interaction(hint),
        CdpError::FrameNotFound(_) => NavError::Interaction(format!("{} (frame was detached)", hint)),
        CdpError::Chrome(_) | CdpError::ChromeMessage(_) if is_context_lost(&hint) => {
            NavError::Interaction(hint)
        }
        CdpError::Ws(_)
        | CdpError::Io(_)
        | CdpError::ChannelSendError(_)
        | CdpError::NoResponse
        | CdpError::LaunchExit(_, _)
        | CdpError::LaunchTimeout(_)
        | CdpError::LaunchIo(_, _) => NavError::Connection(hint),
        _ => NavError::Internal(hint),
    }
}

async fn tracked<T, F>(op: &'static str, fut: F) -> NavResult<T>
where
    F: Future<Output = NavResult<T>>,
{
    let started = Instant::now();
    let result = fut.await;
    metrics::record_operation(op, started.elapsed(), result.is_ok());
    if let Err(err) = &result {
        debug!(op, %err, "navigator operation failed");
    }
    result
}

async fn eval<T: DeserializeOwned>(page: &Page, expression: String) -> NavResult<T> {
    page.evaluate(expression)
        .await
        .map_err(|err| map_cdp_error("evaluate", err))?
        .into_value::<T>()
        .map_err(|err| NavError::Internal(format!("unexpected script result: {}", err)))
}

/// Navigator bound to one chromiumoxide [`Page`]
pub struct CdpNavigator {
    page: Page,
    policy: WaitPolicy,
    screenshot_dir: PathBuf,
}

impl CdpNavigator {
    pub fn new(page: Page, policy: WaitPolicy, screenshot_dir: PathBuf) -> Self {
        Self {
            page,
            policy,
            screenshot_dir,
        }
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    pub(crate) fn replace_page(&mut self, page: Page) -> Page {
        std::mem::replace(&mut self.page, page)
    }
}

#[async_trait]
impl PageNavigator for CdpNavigator {
    async fn goto(&mut self, url: &str) -> NavResult<()> {
        let page = &self.page;
        tracked("goto", async move {
            page.goto(url)
                .await
                .map_err(|err| map_cdp_error(&format!("navigate to {}", url), err))?;
            Ok(())
        })
        .await
    }

    async fn click(&mut self, selector: &str) -> NavResult<()> {
        self.click_nth(selector, 0).await
    }

    async fn click_nth(&mut self, selector: &str, index: usize) -> NavResult<()> {
        let page = &self.page;
        tracked("click", async move {
            if script::is_css(selector) {
                let elements = page
                    .find_elements(selector)
                    .await
                    .map_err(|err| map_cdp_error(selector, err))?;
                let element = elements
                    .get(index)
                    .ok_or_else(|| NavError::NotFound(format!("{}[{}]", selector, index)))?;
                element
                    .click()
                    .await
                    .map_err(|err| map_cdp_error(&format!("click {}", selector), err))?;
                return Ok(());
            }

            let clicked: bool = eval(page, script::click_nth(selector, index)).await?;
            if clicked {
                Ok(())
            } else {
                Err(NavError::NotFound(format!("{}[{}]", selector, index)))
            }
        })
        .await
    }

    async fn fill(&mut self, selector: &str, value: &str) -> NavResult<()> {
        let page = &self.page;
        tracked("fill", async move {
            let filled: bool = eval(page, script::fill(selector, value)).await?;
            if filled {
                Ok(())
            } else {
                Err(NavError::NotFound(selector.to_string()))
            }
        })
        .await
    }

    async fn count(&mut self, selector: &str) -> NavResult<usize> {
        tracked("count", eval(&self.page, script::count(selector))).await
    }

    async fn is_visible(&mut self, selector: &str) -> NavResult<bool> {
        tracked("is_visible", eval(&self.page, script::is_visible(selector))).await
    }

    async fn text(&mut self, selector: &str) -> NavResult<Option<String>> {
        Ok(self.texts(selector).await?.into_iter().next())
    }

    async fn texts(&mut self, selector: &str) -> NavResult<Vec<String>> {
        tracked("texts", eval(&self.page, script::texts(selector))).await
    }

    async fn child_texts(
        &mut self,
        parent: &str,
        index: usize,
        child: &str,
    ) -> NavResult<Vec<String>> {
        tracked(
            "child_texts",
            eval(&self.page, script::child_texts(parent, index, child)),
        )
        .await
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> NavResult<()> {
        let page = &self.page;
        let interval = self.policy.poll_interval;
        let what = format!("{} to be {:?}", selector, state);
        tracked(
            "wait_for",
            poll_until(&what, timeout, interval, is_page_reloading, || {
                eval::<bool>(page, script::state_reached(selector, state))
            }),
        )
        .await
    }

    async fn wait_for_load(&mut self, timeout: Duration) -> NavResult<()> {
        let page = &self.page;
        let interval = self.policy.poll_interval;
        tracked(
            "wait_for_load",
            poll_until("document load", timeout, interval, is_page_reloading, || {
                eval::<bool>(page, script::READY_STATE.to_string())
            }),
        )
        .await
    }

    async fn pause(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn screenshot(&mut self, name: &str) -> NavResult<PathBuf> {
        let page = &self.page;
        let path = self.screenshot_dir.join(format!("{}.png", name));
        tracked("screenshot", async move {
            let bytes = page
                .screenshot(
                    ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .full_page(true)
                        .build(),
                )
                .await
                .map_err(|err| map_cdp_error("screenshot", err))?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| NavError::Internal(err.to_string()))?;
            }
            tokio::fs::write(&path, bytes).await.map_err(|err| {
                warn!(path = %path.display(), %err, "failed to write screenshot");
                NavError::Internal(err.to_string())
            })?;
            Ok(path)
        })
        .await
    }

    async fn current_url(&mut self) -> NavResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|err| map_cdp_error("current url", err))?;
        Ok(url.unwrap_or_default())
    }
}
