use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use super::{ResultsPage, degrade, placeholder};
use crate::context::SyncContext;
use crate::locator::{ElementHandle, ElementList};
use crate::recovery::ActionResult;
use crate::session::{ENTER_KEY, Session};
use crate::sites::Store;

const CONSENT_TIMEOUT: Duration = Duration::from_secs(3);
const SEARCH_BUTTON_TIMEOUT: Duration = Duration::from_secs(5);

/// Store home page, also the entry point to the deals page
pub struct HomePage<'c, S: Session> {
    ctx: &'c SyncContext<S>,
    store: Store,
    search_input: ElementHandle<S::Element>,
    search_button: ElementHandle<S::Element>,
    consent_button: Option<ElementHandle<S::Element>>,
    deals_link: ElementHandle<S::Element>,
    deals_heading: ElementHandle<S::Element>,
    deals_items: ElementList,
}

impl<'c, S: Session> HomePage<'c, S> {
    pub fn new(ctx: &'c SyncContext<S>, store: Store) -> Self {
        let catalog = &store.catalog().home;
        HomePage {
            ctx,
            store,
            search_input: ElementHandle::new("search input", catalog.search_input.clone()),
            search_button: ElementHandle::new("search button", catalog.search_button.clone()),
            consent_button: catalog
                .consent_button
                .clone()
                .map(|l| ElementHandle::new("cookie consent button", l)),
            deals_link: ElementHandle::new("deals link", catalog.deals_link.clone()),
            deals_heading: ElementHandle::new("deals heading", catalog.deals_heading.clone()),
            deals_items: ElementList::new("deals items", catalog.deals_items.clone()),
        }
    }

    pub fn store(&self) -> Store {
        self.store
    }

    /// Navigate to `url` and dismiss the cookie banner if one shows up
    pub async fn open(&self, url: &str) -> Result<()> {
        self.ctx.navigate(url).await?;

        if let Some(consent) = &self.consent_button {
            if self.ctx.is_ready(consent, Some(CONSENT_TIMEOUT)).await? {
                let result = self.ctx.click(consent).await?;
                if result.succeeded() {
                    info!("Accepted cookie banner on {}", self.store);
                } else {
                    warn!("Could not accept cookie banner on {}: {:?}", self.store, result);
                }
            } else {
                info!("No cookie banner on {}", self.store);
            }
        }
        Ok(())
    }

    /// Type `term`, submit, and wait for the results page to settle.
    ///
    /// Falls back to pressing Enter in the field when the submit button does
    /// not become ready in time or the click does not go through.
    pub async fn search_for(&self, term: &str) -> Result<ResultsPage<'c, S>> {
        self.ctx
            .type_text(&self.search_input, term)
            .await?
            .ensure(self.search_input.name())?;

        let clicked = if self
            .ctx
            .is_ready(&self.search_button, Some(SEARCH_BUTTON_TIMEOUT))
            .await?
        {
            match self.ctx.click(&self.search_button).await? {
                ActionResult::Failed(reason) => {
                    warn!(
                        "{} search button click failed ({}), submitting with Enter",
                        self.store, reason
                    );
                    false
                }
                _ => true,
            }
        } else {
            warn!(
                "{} search button not ready, submitting with Enter",
                self.store
            );
            false
        };

        if !clicked {
            self.ctx
                .press(&self.search_input, ENTER_KEY)
                .await?
                .ensure(self.search_input.name())
                .context("Failed to submit search")?;
        }

        ResultsPage::load(self.ctx, self.store, term).await
    }

    pub async fn open_deals(&self) -> Result<()> {
        self.ctx
            .click(&self.deals_link)
            .await?
            .ensure(self.deals_link.name())?;
        Ok(())
    }

    pub async fn deals_page_visible(&self) -> bool {
        degrade(
            "deals_page_visible",
            self.ctx.is_displayed(&self.deals_heading).await,
            false,
        )
    }

    pub async fn deals_heading_text(&self) -> String {
        if !self.deals_page_visible().await {
            return placeholder::NO_DEALS_HEADING.to_string();
        }
        degrade(
            "deals_heading_text",
            self.ctx.text_of(&self.deals_heading).await,
            None,
        )
        .unwrap_or_else(|| placeholder::NO_DEALS_HEADING.to_string())
    }

    /// Heading the deals page is expected to show
    pub fn expected_deals_heading(&self) -> &'static str {
        self.store.catalog().home.deals_heading_text
    }

    /// Number of deals listed, 0 unless the first one is visible
    pub async fn deals_count(&self) -> usize {
        let visible = degrade(
            "deals_count",
            self.ctx.first_item_displayed(&self.deals_items).await,
            false,
        );
        if !visible {
            return 0;
        }
        degrade("deals_count", self.ctx.count(&self.deals_items).await, 0)
    }
}
