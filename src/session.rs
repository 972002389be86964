//! Contract the engine needs from a browser session

use thiserror::Error;

use crate::locator::Locator;
use crate::types::BoundingBox;

/// Driver failure, classified by how the engine reacts to it
#[derive(Debug, Error)]
pub enum DriverError {
    /// Nothing in the DOM matches the locator
    #[error("no element matches {0}")]
    NoSuchElement(String),
    /// The referenced node was detached or replaced
    #[error("stale element reference: {0}")]
    Stale(String),
    /// The element exists but cannot receive the interaction right now
    #[error("element not interactable: {0}")]
    NotInteractable(String),
    /// Anything else; never retried
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl DriverError {
    /// Signals that polling absorbs instead of aborting on
    pub fn is_transient(&self) -> bool {
        !matches!(self, DriverError::Fatal(_))
    }
}

/// Browser session operations consumed by the synchronization engine.
///
/// Element operations take the live reference returned by `find`; any of them
/// may report [`DriverError::Stale`] once the node is gone.
#[allow(async_fn_in_trait)]
pub trait Session {
    type Element: Clone + std::fmt::Debug;

    async fn find(&self, locator: &Locator) -> Result<Self::Element, DriverError>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, DriverError>;

    async fn is_displayed(&self, element: &Self::Element) -> Result<bool, DriverError>;
    async fn is_enabled(&self, element: &Self::Element) -> Result<bool, DriverError>;
    async fn bounding_box(&self, element: &Self::Element) -> Result<BoundingBox, DriverError>;
    async fn text(&self, element: &Self::Element) -> Result<String, DriverError>;

    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;
    async fn clear(&self, element: &Self::Element) -> Result<(), DriverError>;
    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<(), DriverError>;

    async fn navigate(&self, url: &str) -> Result<(), DriverError>;
    async fn current_url(&self) -> Result<String, DriverError>;
    async fn title(&self) -> Result<String, DriverError>;
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// End the browser session
    async fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Key sequence for the Enter key, as understood by WebDriver's send-keys
pub const ENTER_KEY: &str = "\u{E007}";
