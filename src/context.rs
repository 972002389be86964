//! Per-scenario synchronization context: one session plus its timeouts.
//!
//! Page objects borrow a `SyncContext` and route every interaction through
//! it, so waiting and staleness recovery are applied uniformly.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::condition::{Condition, ConditionGroup};
use crate::config::Config;
use crate::locator::{ElementHandle, ElementList};
use crate::recovery::{Action, ActionResult, StalenessRecoveryPolicy};
use crate::session::{DriverError, Session};
use crate::waiter::{PollingWaiter, WaitOutcome};

const MIN_READY_TIMEOUT: Duration = Duration::from_secs(1);

pub struct SyncContext<S> {
    session: S,
    timeout: Duration,
    poll_interval: Duration,
    short_timeout: Duration,
}

impl<S: Session> SyncContext<S> {
    pub fn new(session: S, config: &Config) -> Self {
        SyncContext {
            session,
            timeout: config.timeout,
            poll_interval: config.poll_interval,
            short_timeout: config.short_timeout(),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Give the session back for disposal
    pub fn into_session(self) -> S {
        self.session
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn waiter(&self) -> PollingWaiter {
        PollingWaiter::new(self.timeout, self.poll_interval)
    }

    pub fn waiter_with_timeout(&self, timeout: Duration) -> PollingWaiter {
        self.waiter().with_timeout(timeout)
    }

    pub async fn wait_for(
        &self,
        group: &ConditionGroup<'_, S::Element>,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome> {
        let waiter = match timeout {
            Some(t) => self.waiter_with_timeout(t),
            None => self.waiter(),
        };
        waiter.wait(&self.session, group).await
    }

    /// Wait until visible and clickable, then click
    pub async fn click(&self, handle: &ElementHandle<S::Element>) -> Result<ActionResult> {
        let result = StalenessRecoveryPolicy::new(self.waiter())
            .perform(&self.session, handle, Action::Click)
            .await?;
        debug!("click {} -> {:?}", handle.name(), result);
        Ok(result)
    }

    /// Wait until visible, clear the field, then type
    pub async fn type_text(
        &self,
        handle: &ElementHandle<S::Element>,
        text: &str,
    ) -> Result<ActionResult> {
        let result = StalenessRecoveryPolicy::new(self.waiter())
            .perform(&self.session, handle, Action::Type(text))
            .await?;
        debug!("type into {} -> {:?}", handle.name(), result);
        Ok(result)
    }

    /// Short visibility check: false unless the element shows up within
    /// `min(3s, default / 2)`
    pub async fn is_displayed(&self, handle: &ElementHandle<S::Element>) -> Result<bool> {
        let outcome = self
            .wait_for(
                &ConditionGroup::single(Condition::Visible(handle)),
                Some(self.short_timeout),
            )
            .await?;
        Ok(outcome.is_satisfied())
    }

    /// Visible and clickable within `timeout` (default: half the page budget)
    pub async fn is_ready(
        &self,
        handle: &ElementHandle<S::Element>,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let timeout = timeout
            .unwrap_or(self.timeout / 2)
            .max(MIN_READY_TIMEOUT);
        let outcome = self
            .wait_for(
                &ConditionGroup::single(Condition::Clickable(handle)),
                Some(timeout),
            )
            .await?;
        Ok(outcome.is_satisfied())
    }

    /// Non-empty list whose first item becomes visible within the short budget
    pub async fn first_item_displayed(&self, list: &ElementList) -> Result<bool> {
        let outcome = self
            .wait_for(
                &ConditionGroup::single(Condition::FirstVisible(list)),
                Some(self.short_timeout),
            )
            .await?;
        Ok(outcome.is_satisfied())
    }

    /// Trimmed text of the element, `None` if it is gone
    pub async fn text_of(&self, handle: &ElementHandle<S::Element>) -> Result<Option<String>> {
        let read = match handle.resolve(&self.session).await {
            Ok(element) => self.session.text(&element).await,
            Err(e) => Err(e),
        };
        match read {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(DriverError::Stale(_)) => {
                handle.invalidate().await;
                Ok(None)
            }
            Err(DriverError::Fatal(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Texts of every element in the list, trimmed
    pub async fn texts_of(&self, list: &ElementList) -> Result<Vec<String>> {
        let elements = match list.resolve_all(&self.session).await {
            Ok(elements) => elements,
            Err(DriverError::Fatal(e)) => return Err(e),
            Err(_) => return Ok(Vec::new()),
        };
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            match self.session.text(element).await {
                Ok(text) => texts.push(text.trim().to_string()),
                Err(DriverError::Fatal(e)) => return Err(e),
                Err(_) => {}
            }
        }
        Ok(texts)
    }

    pub async fn count(&self, list: &ElementList) -> Result<usize> {
        match list.resolve_all(&self.session).await {
            Ok(elements) => Ok(elements.len()),
            Err(DriverError::Fatal(e)) => Err(e),
            Err(_) => Ok(0),
        }
    }

    /// Wait until visible, then send raw keys (e.g. Enter) without clearing
    pub async fn press(
        &self,
        handle: &ElementHandle<S::Element>,
        keys: &str,
    ) -> Result<ActionResult> {
        let result = StalenessRecoveryPolicy::new(self.waiter())
            .perform(&self.session, handle, Action::Press(keys))
            .await?;
        debug!("send keys to {} -> {:?}", handle.name(), result);
        Ok(result)
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.session
            .navigate(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.session.current_url().await?)
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self.session.title().await?)
    }

    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.session.screenshot().await?)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;
