//! One browser session per request

use action_primitives::{
    BrowserSession, NavError, NavResult, PageNavigator, SessionFactory, SessionScope, WaitPolicy,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::Handler;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::navigator::{map_cdp_error, CdpNavigator};

/// Opens isolated sessions: a fresh Chromium per request, or a fresh page on
/// a remote DevTools endpoint when `remote_url` is configured.
pub struct CdpSessionFactory {
    config: CdpConfig,
    policy: WaitPolicy,
}

impl CdpSessionFactory {
    pub fn new(config: CdpConfig, policy: WaitPolicy) -> Self {
        Self { config, policy }
    }

    fn browser_config(&self) -> NavResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.config.window_width, self.config.window_height)
            .launch_timeout(self.config.launch_timeout)
            .request_timeout(self.config.request_timeout);

        if !self.config.headless {
            builder = builder.with_head();
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = self.config.resolve_executable() {
            builder = builder.chrome_executable(executable);
        }
        builder = builder.args(vec![
            "--disable-background-networking",
            "--disable-default-apps",
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--disable-popup-blocking",
            "--no-first-run",
            "--no-default-browser-check",
        ]);

        builder
            .build()
            .map_err(|err| NavError::Internal(format!("browser config error: {}", err)))
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                debug!(%err, "cdp handler loop ended");
                break;
            }
        }
    })
}

#[async_trait]
impl SessionFactory for CdpSessionFactory {
    async fn open(&self, scope: &SessionScope) -> NavResult<Box<dyn BrowserSession>> {
        let (mut browser, handler, owned) = match &self.config.remote_url {
            Some(url) => {
                let (browser, handler) = Browser::connect(url.as_str())
                    .await
                    .map_err(|err| map_cdp_error("connect to devtools", err))?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = Browser::launch(self.browser_config()?)
                    .await
                    .map_err(|err| map_cdp_error("launch chromium", err))?;
                (browser, handler, true)
            }
        };
        let handler = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                shutdown_browser(&mut browser, handler, owned).await;
                return Err(map_cdp_error("open page", err));
            }
        };

        info!(
            request = %scope.request_id,
            label = %scope.label,
            remote = !owned,
            "browser session opened"
        );

        Ok(Box::new(CdpSession {
            browser,
            handler,
            owned,
            navigator: CdpNavigator::new(page, self.policy, scope.screenshot_dir.clone()),
        }))
    }
}

async fn close_page(page: Page) {
    if let Err(err) = page.close().await {
        debug!(%err, "page close failed");
    }
}

async fn shutdown_browser(browser: &mut Browser, handler: JoinHandle<()>, owned: bool) {
    if owned {
        if let Err(err) = browser.close().await {
            warn!(%err, "browser close failed");
        }
        if let Err(err) = browser.wait().await {
            warn!(%err, "browser process wait failed");
        }
    }
    handler.abort();
}

/// A browser session backed by chromiumoxide
pub struct CdpSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Launched by us, so closing kills the process
    owned: bool,
    navigator: CdpNavigator,
}

#[async_trait]
impl BrowserSession for CdpSession {
    fn navigator(&mut self) -> &mut dyn PageNavigator {
        &mut self.navigator
    }

    async fn reset(&mut self) -> NavResult<()> {
        let fresh = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| map_cdp_error("reset page", err))?;
        let stale = self.navigator.replace_page(fresh);
        close_page(stale).await;
        info!("browser session reset");
        Ok(())
    }

    async fn close(self: Box<Self>) -> NavResult<()> {
        let CdpSession {
            mut browser,
            handler,
            owned,
            navigator,
        } = *self;
        close_page(navigator.page().clone()).await;
        shutdown_browser(&mut browser, handler, owned).await;
        info!("browser session closed");
        Ok(())
    }
}
