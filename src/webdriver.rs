use anyhow::{Context, Result};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::StorecheckError;
use crate::locator::{Locator, Strategy};
use crate::session::{DriverError, Session};
use crate::types::{BoundingBox, ViewportSize};

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserType {
    /// Default WebDriver endpoint for this browser
    pub fn default_webdriver_url(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "http://localhost:4444",
            BrowserType::Chrome => "http://localhost:9515",
        }
    }

    pub fn driver_name(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

/// Capabilities for a new session
pub fn capabilities(
    browser_type: BrowserType,
    headless: bool,
    viewport: ViewportSize,
) -> serde_json::Map<String, serde_json::Value> {
    let mut caps = serde_json::Map::new();

    match browser_type {
        BrowserType::Firefox => {
            let mut firefox_opts = serde_json::Map::new();
            let mut args = Vec::new();

            if headless {
                args.push("--headless".to_string());
            }
            args.push(format!("--width={}", viewport.width));
            args.push(format!("--height={}", viewport.height));

            firefox_opts.insert("args".to_string(), json!(args));
            caps.insert("moz:firefoxOptions".to_string(), json!(firefox_opts));
        }
        BrowserType::Chrome => {
            let mut chrome_opts = serde_json::Map::new();
            let mut args = vec![
                "--disable-extensions".to_string(),
                "--disable-popup-blocking".to_string(),
            ];

            if headless {
                // Chrome 112+ headless mode
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
                args.push(format!(
                    "--window-size={},{}",
                    viewport.width, viewport.height
                ));
            } else {
                args.push("--start-maximized".to_string());
            }

            chrome_opts.insert("args".to_string(), json!(args));
            caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
        }
    }

    caps
}

async fn is_webdriver_running(url: &str) -> bool {
    // Try to connect to the WebDriver status endpoint
    let status_url = format!("{}/status", url.trim_end_matches('/'));

    match reqwest::get(&status_url).await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Browser session over a WebDriver server
pub struct WebDriverSession {
    client: Client,
    browser_type: BrowserType,
}

impl WebDriverSession {
    /// Connect to the configured WebDriver server and start a session.
    ///
    /// The driver process is expected to be running already; failures are
    /// reported as [`StorecheckError::SessionUnavailable`].
    pub async fn connect(config: &Config) -> Result<Self> {
        let browser_type = config.browser;
        let webdriver_url = config
            .webdriver_url
            .clone()
            .unwrap_or_else(|| browser_type.default_webdriver_url().to_string());

        info!("Connecting to {:?} WebDriver at {}", browser_type, webdriver_url);

        if !is_webdriver_running(&webdriver_url).await {
            let driver_name = browser_type.driver_name();
            return Err(StorecheckError::SessionUnavailable(format!(
                "cannot reach {} at {}.\n\
                Please ensure {} is running:\n\
                  For Firefox: geckodriver --port 4444\n\
                  For Chrome: chromedriver --port 9515",
                driver_name, webdriver_url, driver_name
            ))
            .into());
        }

        let caps = capabilities(browser_type, config.headless, config.viewport);
        debug!("Session capabilities: {}", json!(caps));

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&webdriver_url)
            .await
            .map_err(|e| {
                StorecheckError::SessionUnavailable(format!(
                    "failed to start a {:?} session: {}",
                    browser_type, e
                ))
            })?;

        if !config.headless && browser_type == BrowserType::Firefox {
            let vp = config.viewport;
            if let Err(e) = client.set_window_size(vp.width, vp.height).await {
                debug!("Note: Could not set window size: {}", e);
            }
        }

        Ok(WebDriverSession {
            client,
            browser_type,
        })
    }

    pub fn browser_type(&self) -> BrowserType {
        self.browser_type
    }
}

fn fantoccini_locator(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator.strategy {
        Strategy::Id => fantoccini::Locator::Id(&locator.expression),
        Strategy::Css => fantoccini::Locator::Css(&locator.expression),
        Strategy::XPath => fantoccini::Locator::XPath(&locator.expression),
    }
}

/// Variant for a W3C error code the engine can absorb
fn transient_code(code: &str) -> Option<fn(String) -> DriverError> {
    match code {
        "no such element" => Some(DriverError::NoSuchElement),
        "stale element reference" => Some(DriverError::Stale),
        "element not interactable" | "element click intercepted" => {
            Some(DriverError::NotInteractable)
        }
        _ => None,
    }
}

/// Variant for driver errors the engine can absorb, if `err` is one
fn transient_variant(err: &CmdError) -> Option<fn(String) -> DriverError> {
    match err {
        CmdError::NoSuchElement(_) => Some(DriverError::NoSuchElement),
        CmdError::Standard(wd) => transient_code(wd.error()),
        _ => None,
    }
}

pub(crate) fn classify(err: CmdError) -> DriverError {
    match transient_variant(&err) {
        Some(variant) => variant(err.to_string()),
        None => DriverError::Fatal(anyhow::Error::new(err).context("WebDriver command failed")),
    }
}

impl Session for WebDriverSession {
    type Element = Element;

    async fn find(&self, locator: &Locator) -> Result<Element, DriverError> {
        self.client
            .find(fantoccini_locator(locator))
            .await
            .map_err(classify)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, DriverError> {
        self.client
            .find_all(fantoccini_locator(locator))
            .await
            .map_err(classify)
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, DriverError> {
        element.is_displayed().await.map_err(classify)
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, DriverError> {
        element.is_enabled().await.map_err(classify)
    }

    async fn bounding_box(&self, element: &Element) -> Result<BoundingBox, DriverError> {
        let (x, y, width, height) = element.rectangle().await.map_err(classify)?;
        Ok(BoundingBox {
            x,
            y,
            width,
            height,
        })
    }

    async fn text(&self, element: &Element) -> Result<String, DriverError> {
        element.text().await.map_err(classify)
    }

    async fn click(&self, element: &Element) -> Result<(), DriverError> {
        element.click().await.map_err(classify)
    }

    async fn clear(&self, element: &Element) -> Result<(), DriverError> {
        element.clear().await.map_err(classify)
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), DriverError> {
        element.send_keys(text).await.map_err(classify)
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.client.goto(url).await.map_err(classify)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let url = self.client.current_url().await.map_err(classify)?;
        Ok(url.to_string())
    }

    async fn title(&self) -> Result<String, DriverError> {
        self.client.title().await.map_err(classify)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.client.screenshot().await.map_err(classify)
    }

    async fn close(self) -> Result<(), DriverError> {
        info!("Closing {:?} session", self.browser_type);
        self.client
            .close()
            .await
            .context("Failed to close WebDriver session")
            .map_err(DriverError::Fatal)
    }
}

#[cfg(test)]
#[path = "webdriver_test.rs"]
mod webdriver_test;
