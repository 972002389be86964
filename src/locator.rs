//! How elements are found, and lazily-bound handles to them

use std::borrow::Cow;
use std::fmt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::session::{DriverError, Session};

/// Lookup strategy understood by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Id,
    Css,
    XPath,
}

/// Strategy + expression pair identifying how to find an element
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub expression: Cow<'static, str>,
}

impl Locator {
    pub const fn id(expression: &'static str) -> Self {
        Locator {
            strategy: Strategy::Id,
            expression: Cow::Borrowed(expression),
        }
    }

    pub const fn css(expression: &'static str) -> Self {
        Locator {
            strategy: Strategy::Css,
            expression: Cow::Borrowed(expression),
        }
    }

    pub const fn xpath(expression: &'static str) -> Self {
        Locator {
            strategy: Strategy::XPath,
            expression: Cow::Borrowed(expression),
        }
    }

    pub fn new(strategy: Strategy, expression: impl Into<String>) -> Self {
        Locator {
            strategy,
            expression: Cow::Owned(expression.into()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.strategy {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
        };
        write!(f, "{}={}", prefix, self.expression)
    }
}

/// Re-resolvable reference to a single located element.
///
/// Declaring a handle does not touch the driver. The live reference is
/// looked up on first use and cached until a staleness signal clears it.
#[derive(Debug)]
pub struct ElementHandle<E> {
    name: &'static str,
    locator: Locator,
    cached: Mutex<Option<E>>,
}

impl<E: Clone> ElementHandle<E> {
    pub fn new(name: &'static str, locator: Locator) -> Self {
        ElementHandle {
            name,
            locator,
            cached: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Return the cached reference, or query the session for a fresh one
    pub async fn resolve<S>(&self, session: &S) -> Result<E, DriverError>
    where
        S: Session<Element = E>,
    {
        let mut slot = self.cached.lock().await;
        if let Some(element) = slot.as_ref() {
            return Ok(element.clone());
        }
        debug!("Resolving {} ({})", self.name, self.locator);
        let element = session.find(&self.locator).await?;
        *slot = Some(element.clone());
        Ok(element)
    }

    /// Drop the cached reference; the next `resolve` re-queries the DOM
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("Invalidated stale reference for {}", self.name);
        }
    }

    /// Currently bound reference, if any
    pub async fn bound(&self) -> Option<E> {
        self.cached.lock().await.clone()
    }
}

/// Locator for a list of elements; re-queried on every access
#[derive(Debug, Clone)]
pub struct ElementList {
    name: &'static str,
    locator: Locator,
}

impl ElementList {
    pub fn new(name: &'static str, locator: Locator) -> Self {
        ElementList { name, locator }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn resolve_all<S: Session>(
        &self,
        session: &S,
    ) -> Result<Vec<S::Element>, DriverError> {
        session.find_all(&self.locator).await
    }
}

#[cfg(test)]
#[path = "locator_test.rs"]
mod locator_test;
