//! Application configuration
//!
//! Loaded from YAML, then overridden from the environment. Durations are
//! written the human way (`10s`, `2m`) and parsed with `humantime`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use action_primitives::{Credentials, WaitPolicy};
use anyhow::{Context, Result};
use cdp_adapter::CdpConfig;
use disposition_flow::{Actors, RetryPolicy, DEFAULT_RELOAD_SIGNATURES};
use serde::{Deserialize, Serialize};
use transaction_locator::{BpmSelectors, BpmSurface, FircoSelectors, FircoSurface, TransactionLocator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub firco: FircoSection,
    pub bpm: BpmSection,
    pub browser: BrowserSection,
    pub retry: RetrySection,
    pub timeouts: TimeoutSection,
    pub paths: PathsSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FircoSection {
    pub url: String,
    pub operator: Credentials,
    /// Applies escalated actions when present
    pub manager: Option<Credentials>,
    pub selectors: FircoSelectors,
}

impl Default for FircoSection {
    fn default() -> Self {
        Self {
            url: "https://firco.example.com/continuity".to_string(),
            operator: Credentials::default(),
            manager: None,
            selectors: FircoSelectors::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BpmSection {
    /// BPM fallback is skipped when unset
    pub url: Option<String>,
    pub credentials: Credentials,
    pub selectors: BpmSelectors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    /// DevTools endpoint to attach to instead of launching Chromium
    pub remote_url: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub no_sandbox: bool,
    pub launch_timeout: String,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            remote_url: None,
            window_width: 1920,
            window_height: 1080,
            no_sandbox: false,
            launch_timeout: "20s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub backoff: String,
    pub reload_signatures: Vec<String>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: "3s".to_string(),
            reload_signatures: DEFAULT_RELOAD_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub element: String,
    pub page_load: String,
    pub settle: String,
    pub request_deadline: String,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            element: "10s".to_string(),
            page_load: "30s".to_string(),
            settle: "2s".to_string(),
            request_deadline: "10m".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub input: PathBuf,
    pub output: PathBuf,
    pub logs: PathBuf,
    pub screenshots: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            logs: PathBuf::from("logs"),
            screenshots: PathBuf::from("screenshots"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8088,
        }
    }
}

impl ServerSection {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid server address {}:{}", self.host, self.port))
    }
}

fn duration(field: &str, raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw.trim())
        .with_context(|| format!("invalid duration for {}: {:?}", field, raw))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Apply process environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("FIRCO_URL") {
            self.firco.url = url;
        }
        if let Some(user) = get("FIRCO_USERNAME") {
            self.firco.operator.username = user;
        }
        if let Some(password) = get("FIRCO_PASSWORD") {
            self.firco.operator.password = password;
        }
        if let Some(user) = get("FIRCO_MANAGER_USERNAME") {
            self.firco.manager.get_or_insert_with(Credentials::default).username = user;
        }
        if let Some(password) = get("FIRCO_MANAGER_PASSWORD") {
            self.firco.manager.get_or_insert_with(Credentials::default).password = password;
        }
        if let Some(url) = get("BPM_URL") {
            self.bpm.url = Some(url);
        }
        if let Some(user) = get("BPM_USERNAME") {
            self.bpm.credentials.username = user;
        }
        if let Some(password) = get("BPM_PASSWORD") {
            self.bpm.credentials.password = password;
        }
        if let Some(headless) = get("FIRCO_HEADLESS").as_deref().and_then(parse_flag) {
            self.browser.headless = headless;
        }
        if let Some(url) = get("FIRCO_CDP_URL") {
            self.browser.remote_url = Some(url);
        }
        if let Some(dir) = get("FIRCO_INPUT_DIR") {
            self.paths.input = PathBuf::from(dir);
        }
        if let Some(dir) = get("FIRCO_OUTPUT_DIR") {
            self.paths.output = PathBuf::from(dir);
        }
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        Ok(RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            backoff: duration("retry.backoff", &self.retry.backoff)?,
            reload_signatures: self.retry.reload_signatures.clone(),
            deadline: duration("timeouts.request_deadline", &self.timeouts.request_deadline)?,
        })
    }

    pub fn wait_policy(&self) -> Result<WaitPolicy> {
        Ok(WaitPolicy {
            element_timeout: duration("timeouts.element", &self.timeouts.element)?,
            load_timeout: duration("timeouts.page_load", &self.timeouts.page_load)?,
            settle: duration("timeouts.settle", &self.timeouts.settle)?,
            ..WaitPolicy::default()
        })
    }

    pub fn cdp_config(&self) -> Result<CdpConfig> {
        let browser = &self.browser;
        Ok(CdpConfig {
            executable: browser.executable.clone(),
            headless: browser.headless,
            remote_url: browser.remote_url.clone(),
            window_width: browser.window_width,
            window_height: browser.window_height,
            no_sandbox: browser.no_sandbox,
            launch_timeout: duration("browser.launch_timeout", &browser.launch_timeout)?,
            request_timeout: duration("timeouts.page_load", &self.timeouts.page_load)?,
        })
    }

    pub fn actors(&self) -> Actors {
        let actors = Actors::new(self.firco.operator.clone());
        match &self.firco.manager {
            Some(manager) => actors.with_manager(manager.clone()),
            None => actors,
        }
    }

    pub fn bpm_surface(&self) -> Result<Option<BpmSurface>> {
        let Some(url) = self.bpm.url.as_deref().filter(|url| !url.trim().is_empty()) else {
            return Ok(None);
        };
        Ok(Some(BpmSurface::new(
            url,
            self.bpm.credentials.clone(),
            self.bpm.selectors.clone(),
            self.wait_policy()?,
        )))
    }

    pub fn locator(&self) -> Result<TransactionLocator> {
        let firco = FircoSurface::new(
            self.firco.url.clone(),
            self.firco.selectors.clone(),
            self.wait_policy()?,
        );
        let locator = TransactionLocator::new(firco);
        Ok(match self.bpm_surface()? {
            Some(bpm) => locator.with_bpm(bpm),
            None => locator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
firco:
  url: https://firco.bank.internal/continuity
  operator:
    username: "506"
    password: secret
retry:
  max_attempts: 5
timeouts:
  element: 15s
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.firco.url, "https://firco.bank.internal/continuity");
        assert_eq!(config.firco.selectors, FircoSelectors::default());
        assert_eq!(config.server.port, 8088);

        let policy = config.retry_policy().unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, Duration::from_secs(3));
        assert_eq!(policy.deadline, Duration::from_secs(600));
        assert_eq!(
            config.wait_policy().unwrap().element_timeout,
            Duration::from_secs(15)
        );
        assert!(config.bpm_surface().unwrap().is_none());
    }

    #[test]
    fn test_invalid_duration_is_reported() {
        let mut config = Config::default();
        config.timeouts.request_deadline = "soon".into();
        let err = config.retry_policy().unwrap_err();
        assert!(err.to_string().contains("timeouts.request_deadline"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FIRCO_URL", "https://firco.uat/continuity"),
            ("FIRCO_USERNAME", "506"),
            ("FIRCO_PASSWORD", "pw"),
            ("FIRCO_MANAGER_USERNAME", "507"),
            ("FIRCO_MANAGER_PASSWORD", "pw2"),
            ("BPM_URL", "https://bpm.uat/mtexrt"),
            ("FIRCO_HEADLESS", "false"),
            ("FIRCO_OUTPUT_DIR", " "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.firco.url, "https://firco.uat/continuity");
        assert!(!config.browser.headless);
        assert_eq!(config.paths.output, PathBuf::from("output"));
        assert!(config.actors().manager.is_some());
        assert!(config.bpm_surface().unwrap().is_some());
    }

    #[test]
    fn test_credentials_never_serialize_passwords() {
        let mut config = Config::default();
        config.firco.operator = Credentials::new("506", "hunter2");
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("hunter2"));
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
