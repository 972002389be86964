use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use super::{degrade, placeholder};
use crate::context::SyncContext;
use crate::locator::{ElementHandle, ElementList};
use crate::readiness::{ReadinessDetector, ReadinessProbes, ReadinessState};
use crate::session::Session;
use crate::sites::Store;

/// Search results page.
///
/// Readiness is confirmed at construction and can be re-confirmed with
/// [`ResultsPage::confirm_ready`]. When it stays
/// `Unconfirmed` the page is still returned and every query answers with its
/// negative value or placeholder text instead of failing.
pub struct ResultsPage<'c, S: Session> {
    ctx: &'c SyncContext<S>,
    store: Store,
    term: String,
    results_title: ElementHandle<S::Element>,
    empty_message: ElementHandle<S::Element>,
    product_titles: ElementList,
    search_term_echo: Option<ElementHandle<S::Element>>,
    no_results_term: Option<ElementHandle<S::Element>>,
    readiness: ReadinessState,
}

impl<'c, S: Session> ResultsPage<'c, S> {
    pub async fn load(ctx: &'c SyncContext<S>, store: Store, term: &str) -> Result<Self> {
        let catalog = &store.catalog().results;
        let mut page = ResultsPage {
            ctx,
            store,
            term: term.to_string(),
            results_title: ElementHandle::new("results title", catalog.results_title.clone()),
            empty_message: ElementHandle::new("no-results message", catalog.empty_message.clone()),
            product_titles: ElementList::new("product titles", catalog.product_titles.clone()),
            search_term_echo: catalog
                .search_term_echo
                .clone()
                .map(|l| ElementHandle::new("search term echo", l)),
            no_results_term: catalog
                .no_results_term
                .clone()
                .map(|l| ElementHandle::new("no-results searched term", l)),
            readiness: ReadinessState::Unconfirmed,
        };

        page.confirm_ready(None).await?;
        Ok(page)
    }

    /// Re-run readiness detection, within `timeout` or the default budget.
    ///
    /// Safe to repeat: on an unchanged page it reports the same state.
    pub async fn confirm_ready(&mut self, timeout: Option<Duration>) -> Result<ReadinessState> {
        let probes = ReadinessProbes {
            results_title: &self.results_title,
            empty_message: &self.empty_message,
            fallback_list: &self.product_titles,
        };
        let page_name = format!("{} results for '{}'", self.store, self.term);
        self.readiness =
            ReadinessDetector::confirm(self.ctx, &page_name, &probes, timeout).await?;
        Ok(self.readiness)
    }

    pub fn readiness(&self) -> ReadinessState {
        self.readiness
    }

    pub fn store(&self) -> Store {
        self.store
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Results title visible and a visible first product
    pub async fn has_results(&self) -> bool {
        let check = async {
            Ok::<_, anyhow::Error>(
                self.ctx.is_displayed(&self.results_title).await?
                    && self.ctx.first_item_displayed(&self.product_titles).await?,
            )
        };
        degrade("has_results", check.await, false)
    }

    /// Number of listed products, 0 unless [`has_results`](Self::has_results)
    pub async fn results_count(&self) -> usize {
        if !self.has_results().await {
            return 0;
        }
        degrade("results_count", self.ctx.count(&self.product_titles).await, 0)
    }

    pub async fn first_product_title(&self) -> String {
        if !self.has_results().await {
            return placeholder::NO_PRODUCT_TITLE.to_string();
        }
        let titles = degrade(
            "first_product_title",
            self.ctx.texts_of(&self.product_titles).await,
            Vec::new(),
        );
        titles
            .into_iter()
            .next()
            .unwrap_or_else(|| placeholder::NO_PRODUCT_TITLE.to_string())
    }

    pub async fn product_titles(&self) -> Vec<String> {
        degrade(
            "product_titles",
            self.ctx.texts_of(&self.product_titles).await,
            Vec::new(),
        )
    }

    pub async fn results_title_visible(&self) -> bool {
        degrade(
            "results_title_visible",
            self.ctx.is_displayed(&self.results_title).await,
            false,
        )
    }

    pub async fn results_title_text(&self) -> String {
        self.visible_text(&self.results_title, placeholder::NO_RESULTS_TITLE)
            .await
    }

    pub async fn no_results_message_text(&self) -> String {
        self.visible_text(&self.empty_message, placeholder::NO_EMPTY_MESSAGE)
            .await
    }

    /// The term the store says it found nothing for
    pub async fn no_results_term_text(&self) -> String {
        match &self.no_results_term {
            Some(handle) => self.visible_text(handle, placeholder::NO_SEARCHED_TERM).await,
            None => placeholder::NO_SEARCHED_TERM.to_string(),
        }
    }

    /// The searched term as echoed above the results, quotes stripped
    pub async fn search_term_echo_text(&self) -> String {
        match &self.search_term_echo {
            Some(handle) => self
                .visible_text(handle, placeholder::NO_TERM_ECHO)
                .await
                .replace('"', ""),
            None => placeholder::NO_TERM_ECHO.to_string(),
        }
    }

    pub fn echoes_search_term(&self) -> bool {
        self.search_term_echo.is_some()
    }

    async fn visible_text(&self, handle: &ElementHandle<S::Element>, fallback: &str) -> String {
        let read = async {
            if !self.ctx.is_displayed(handle).await? {
                return Ok::<_, anyhow::Error>(None);
            }
            self.ctx.text_of(handle).await
        };
        match degrade(handle.name(), read.await, None) {
            Some(text) => text,
            None => {
                debug!("{} not displayed, returning placeholder", handle.name());
                fallback.to_string()
            }
        }
    }
}
