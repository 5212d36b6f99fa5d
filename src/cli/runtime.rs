use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tokio::fs;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const APP_DIR: &str = "firco-disposition";
const LOG_PREFIX: &str = "transactions.log";

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Load `config/local.env`; variables already set in the environment win
pub fn load_local_env_overrides() {
    let path = Path::new("config/local.env");
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (key, value) in parse_env_lines(&contents) {
                if env::var(&key).is_ok() {
                    continue;
                }
                env::set_var(key, value);
            }
        }
        Err(err) => {
            eprintln!("failed to read {}: {}", path.display(), err);
        }
    }
}

fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), unescape_value(value.trim())))
        })
        .collect()
}

/// Console output plus a daily-rotated `transactions.log.<date>` under `logs_dir`
pub fn init_logging(level: &str, debug: bool, logs_dir: &Path) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    stdfs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create log directory {}", logs_dir.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .build(logs_dir)
        .context("failed to open the transaction log")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.to_string())),
        )
        .with(fmt::layer())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    /// False when defaults were used because no file exists
    pub from_file: bool,
}

/// Read the YAML config, then apply environment overrides
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => {
            // Priority: ./config/config.yaml > ~/.config/firco-disposition/config.yaml
            let local_config = PathBuf::from("config/config.yaml");
            if local_config.exists() {
                local_config
            } else {
                let mut path = dirs::config_dir().context("Failed to get config directory")?;
                path.push(APP_DIR);
                path.push("config.yaml");
                path
            }
        }
    };

    let (mut config, from_file) = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;
        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        (config, true)
    } else {
        (Config::default(), false)
    };
    config.apply_env_overrides();

    Ok(LoadedConfig {
        config,
        path: config_path,
        from_file,
    })
}

/// Log gaps that would only surface at the first login
pub fn warn_incomplete(config: &Config) {
    if !config.firco.operator.is_complete() {
        warn!("operator credentials are missing; set FIRCO_USERNAME and FIRCO_PASSWORD");
    }
    if config.firco.manager.is_none() {
        warn!("no manager credentials; escalated actions will not be applied");
    }
    if config.bpm.url.is_none() {
        warn!("BPM_URL is not set; BPM fallback and lookups are disabled");
    }
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\t", "\t")
    } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}
