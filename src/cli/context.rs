use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_primitives::SessionFactory;
use anyhow::Result;
use cdp_adapter::CdpSessionFactory;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::service::DispositionService;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    service: OnceCell<Arc<DispositionService>>,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            service: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Service backed by a real browser, built on first use
    pub async fn service(&self) -> Result<Arc<DispositionService>> {
        self.service
            .get_or_try_init(|| async {
                let factory: Arc<dyn SessionFactory> = Arc::new(CdpSessionFactory::new(
                    self.config.cdp_config()?,
                    self.config.wait_policy()?,
                ));
                DispositionService::from_config(&self.config, factory).map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }
}
