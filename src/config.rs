//! Harness configuration read from a `config.properties` style file

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::types::ViewportSize;
use crate::webdriver::BrowserType;

pub const CONFIG_FILE_NAME: &str = "config.properties";

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 250;
const DEFAULT_REPORTS_DIR: &str = "target/storecheck-reports";

/// Flat key/value store parsed from a properties file
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Parse `key=value` (or `key: value`) lines; `#` and `!` start comments
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some(split) = line.find(['=', ':']) else {
                debug!("Ignoring property line without separator: {}", line);
                continue;
            };
            let key = line[..split].trim();
            let value = line[split + 1..].trim();
            if !key.is_empty() {
                entries.insert(key.to_string(), value.to_string());
            }
        }
        Properties { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Integer lookup; a missing or malformed value yields `default`
    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        match self.get(key) {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!(
                    "Property '{}' ('{}') is not a valid integer, using default {}",
                    key, raw, default
                );
                default
            }),
            None => {
                debug!("Property '{}' not set, using default {}", key, default);
                default
            }
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|raw| raw.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }
}

/// Resolved settings for one harness run
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Default budget for every wait
    pub timeout: Duration,
    /// Cadence of condition polling
    pub poll_interval: Duration,
    pub browser: BrowserType,
    pub headless: bool,
    /// Window size requested for headless sessions
    pub viewport: ViewportSize,
    /// Explicit WebDriver endpoint; the browser default is used when absent
    pub webdriver_url: Option<String>,
    /// Where failure screenshots are written
    pub reports_dir: PathBuf,
    /// Store base URLs keyed by store name (`amazon.url` -> `amazon`)
    pub store_urls: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config::from_properties(&Properties::default())
    }
}

impl Config {
    pub fn from_properties(props: &Properties) -> Self {
        let browser = props
            .get("browser")
            .and_then(|raw| match raw.parse::<BrowserType>() {
                Ok(browser) => Some(browser),
                Err(e) => {
                    warn!("{}, falling back to chrome", e);
                    None
                }
            })
            .unwrap_or(BrowserType::Chrome);

        let store_urls = props
            .entries
            .iter()
            .filter_map(|(key, value)| {
                let store = key.strip_suffix(".url").filter(|s| *s != "webdriver")?;
                match Url::parse(value) {
                    Ok(_) => Some((store.to_string(), value.clone())),
                    Err(e) => {
                        warn!("Ignoring {} '{}': {}", key, value, e);
                        None
                    }
                }
            })
            .collect();

        Config {
            timeout: Duration::from_secs(
                props.get_u64("timeout.seconds", DEFAULT_TIMEOUT_SECONDS),
            ),
            poll_interval: Duration::from_millis(
                props.get_u64("poll.interval.millis", DEFAULT_POLL_INTERVAL_MILLIS),
            ),
            browser,
            headless: props.get_bool("headless", false),
            viewport: props
                .get("window.size")
                .and_then(|raw| {
                    ViewportSize::parse(raw)
                        .map_err(|e| warn!("Ignoring window.size '{}': {}", raw, e))
                        .ok()
                })
                .unwrap_or_default(),
            webdriver_url: props.get("webdriver.url").map(str::to_string),
            reports_dir: PathBuf::from(props.get("reports.dir").unwrap_or(DEFAULT_REPORTS_DIR)),
            store_urls,
        }
    }

    /// Load from an explicit path, or from the default search locations.
    ///
    /// An explicit path that cannot be read is an error. Without one, a
    /// missing file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let props = match explicit {
            Some(path) => read_properties(path)?,
            None => {
                let candidates = [
                    PathBuf::from(CONFIG_FILE_NAME),
                    Path::new("resources").join(CONFIG_FILE_NAME),
                ];
                match candidates.iter().find(|p| p.is_file()) {
                    Some(path) => read_properties(path)?,
                    None => {
                        warn!(
                            "No {} found in working directory, using defaults",
                            CONFIG_FILE_NAME
                        );
                        Properties::default()
                    }
                }
            }
        };

        let mut config = Config::from_properties(&props);
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Environment overrides take precedence over the file
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(browser) = lookup("STORECHECK_BROWSER") {
            self.browser = browser.parse()?;
        }
        if let Some(headless) = lookup("STORECHECK_HEADLESS") {
            self.headless = headless.trim().eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    pub fn store_url(&self, store: &str) -> Option<&str> {
        self.store_urls.get(store).map(String::as_str)
    }

    /// Short budget used for "is it there right now" checks
    pub fn short_timeout(&self) -> Duration {
        (self.timeout / 2).min(Duration::from_secs(3))
    }
}

fn read_properties(path: &Path) -> Result<Properties> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
    info!("Loaded configuration from {}", path.display());
    Ok(Properties::parse(&content))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
