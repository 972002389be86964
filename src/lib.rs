//! # storecheck
#![allow(clippy::uninlined_format_args)]
//!
//! Acceptance checks for e-commerce search pages, driven through WebDriver.
//!
//! At its core is a synchronization engine that keeps browser scenarios
//! stable against pages that render asynchronously: element handles that
//! re-resolve after the DOM is replaced, composite wait conditions polled
//! against a deadline, a single-retry staleness recovery for clicks and
//! typing, and best-effort detection of which state a results page settled
//! in.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Search a store and expect products
//! storecheck search amazon "Kindle"
//!
//! # Expect the empty-results page instead
//! storecheck search magalu "produtoinexistenteklok456" --expect empty
//!
//! # Open the deals page
//! storecheck deals amazon --browser firefox --headless
//!
//! # Show the resolved configuration
//! storecheck config
//! ```
//!
//! A WebDriver server must already be running (`chromedriver --port 9515` or
//! `geckodriver --port 4444`).
//!
//! ## Library Usage
//!
//! ```no_run
//! use storecheck::{Config, HomePage, Store, SyncContext, WebDriverSession};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let session = WebDriverSession::connect(&config).await?;
//! let ctx = SyncContext::new(session, &config);
//!
//! let home = HomePage::new(&ctx, Store::Amazon);
//! home.open(Store::Amazon.default_url()).await?;
//! let results = home.search_for("Kindle").await?;
//! println!("{}: {}", results.readiness(), results.first_product_title().await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `config.properties` (or `resources/config.properties`)
//! in the working directory; `STORECHECK_BROWSER` and `STORECHECK_HEADLESS`
//! override the file.

/// Element readiness conditions and their composition
pub mod condition;

/// Properties-file configuration
pub mod config;

/// Per-session synchronization context
pub mod context;

/// Error taxonomy and exit codes
pub mod errors;

/// Locators and re-resolvable element handles
pub mod locator;

/// Store home and results page objects
pub mod pages;

/// Best-effort page readiness detection
pub mod readiness;

/// Single-retry staleness recovery for interactions
pub mod recovery;

/// Scenario lifecycle
pub mod scenario;

/// Browser session contract
pub mod session;

/// Selector catalogs per store
pub mod sites;

/// Scenario steps and assertions
pub mod steps;

/// Shared value types
pub mod types;

/// Deadline-bounded condition polling
pub mod waiter;

/// WebDriver-backed browser session
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake_session;

pub use condition::{Combinator, Condition, ConditionGroup, Outcome};
pub use config::Config;
pub use context::SyncContext;
pub use errors::StorecheckError;
pub use locator::{ElementHandle, ElementList, Locator, Strategy};
pub use pages::{HomePage, ResultsPage};
pub use readiness::{ReadinessDetector, ReadinessState, ReadinessVariant};
pub use recovery::{Action, ActionResult, StalenessRecoveryPolicy};
pub use scenario::{Scenario, ScenarioReport, Status};
pub use session::{DriverError, Session};
pub use sites::Store;
pub use steps::{Step, Steps};
pub use types::{BoundingBox, ViewportSize};
pub use waiter::{PollingWaiter, WaitOutcome};
pub use webdriver::{BrowserType, WebDriverSession};
