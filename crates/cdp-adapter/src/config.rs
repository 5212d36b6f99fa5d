//! Browser launch configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use which::which;

/// How sessions obtain a browser
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CdpConfig {
    /// Chromium binary; detected from `PATH` and well-known locations when unset
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// Attach to an existing DevTools endpoint instead of launching
    pub remote_url: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub no_sandbox: bool,
    pub launch_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            remote_url: None,
            window_width: 1920,
            window_height: 1080,
            no_sandbox: false,
            launch_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpConfig {
    /// Explicit executable, else the first Chromium found on the host
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        self.executable
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(detect_chrome_executable)
    }
}

fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("FIRCO_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        ["ProgramFiles", "ProgramFiles(x86)", "LOCALAPPDATA"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(PathBuf::from)
            .flat_map(|root| {
                [
                    root.join("Google/Chrome/Application/chrome.exe"),
                    root.join("Microsoft/Edge/Application/msedge.exe"),
                ]
            })
            .collect()
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}
