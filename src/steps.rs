//! Scenario steps and their assertions.
//!
//! Every failed check is reported as [`StorecheckError::Assertion`] with the
//! expected and actual values; unknown option or page names are
//! [`StorecheckError::Contract`] errors.

use anyhow::{Result, anyhow};
use serde::Serialize;
use std::fmt;
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::context::SyncContext;
use crate::errors::StorecheckError;
use crate::pages::{HomePage, ResultsPage};
use crate::session::Session;
use crate::sites::Store;

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", content = "arg", rename_all = "snake_case")]
pub enum Step {
    OpenStore(Store),
    Search(String),
    ExpectResults,
    ExpectMoreThan(usize),
    /// No-results message contains the given text and the searched term
    ExpectNoResults(String),
    ExpectFirstResultContains(String),
    ClickOption(String),
    ExpectPage(String),
    ExpectDealsListed,
    ExpectReadinessConfirmed,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::OpenStore(store) => write!(f, "Given I am on the {} home page", store),
            Step::Search(term) => write!(f, "When I search for \"{}\"", term),
            Step::ExpectResults => write!(f, "Then search results should be displayed"),
            Step::ExpectMoreThan(n) => write!(f, "Then more than {} products should be listed", n),
            Step::ExpectNoResults(text) => {
                write!(f, "Then a \"{}\" message should be displayed", text)
            }
            Step::ExpectFirstResultContains(term) => {
                write!(f, "Then the first result should contain \"{}\"", term)
            }
            Step::ClickOption(name) => write!(f, "When I click on \"{}\"", name),
            Step::ExpectPage(name) => write!(f, "Then the \"{}\" page should be displayed", name),
            Step::ExpectDealsListed => write!(f, "Then deals should be listed"),
            Step::ExpectReadinessConfirmed => write!(f, "Then the results page should have loaded"),
        }
    }
}

/// Names accepted for the deals entry point
fn is_deals_keyword(name: &str) -> bool {
    matches!(
        name.trim().to_lowercase().as_str(),
        "ofertas do dia" | "deals" | "ofertas"
    )
}

/// True when `url` is served from `host` or one of its subdomains
fn on_host(url: &str, host: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|h| h == host || h.ends_with(&format!(".{}", host)))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn check(
    holds: bool,
    message: &str,
    expected: impl fmt::Display,
    actual: impl fmt::Display,
) -> Result<()> {
    if holds {
        Ok(())
    } else {
        Err(StorecheckError::assertion(message, expected, actual).into())
    }
}

/// Step state for one scenario: the pages reached so far
pub struct Steps<'c, S: Session> {
    ctx: &'c SyncContext<S>,
    config: &'c Config,
    home: Option<HomePage<'c, S>>,
    results: Option<ResultsPage<'c, S>>,
}

impl<'c, S: Session> Steps<'c, S> {
    pub fn new(ctx: &'c SyncContext<S>, config: &'c Config) -> Self {
        Steps {
            ctx,
            config,
            home: None,
            results: None,
        }
    }

    pub fn results(&self) -> Option<&ResultsPage<'c, S>> {
        self.results.as_ref()
    }

    pub async fn run(&mut self, step: &Step) -> Result<()> {
        info!("{}", step);
        match step {
            Step::OpenStore(store) => self.open_store(*store).await,
            Step::Search(term) => self.search(term).await,
            Step::ExpectResults => self.expect_results().await,
            Step::ExpectMoreThan(n) => self.expect_more_than(*n).await,
            Step::ExpectNoResults(text) => self.expect_no_results(text).await,
            Step::ExpectFirstResultContains(term) => {
                self.expect_first_result_contains(term).await
            }
            Step::ClickOption(name) => self.click_option(name).await,
            Step::ExpectPage(name) => self.expect_page(name).await,
            Step::ExpectDealsListed => self.expect_deals_listed().await,
            Step::ExpectReadinessConfirmed => self.expect_readiness_confirmed(),
        }
    }

    pub async fn open_store(&mut self, store: Store) -> Result<()> {
        let url = self
            .config
            .store_url(store.key())
            .unwrap_or(store.default_url())
            .to_string();

        let home = HomePage::new(self.ctx, store);
        home.open(&url).await?;

        let current = self.ctx.current_url().await?;
        check(
            on_host(&current, store.host()),
            &format!("{} home page did not open", store),
            format!("URL on {}", store.host()),
            &current,
        )?;

        self.home = Some(home);
        self.results = None;
        Ok(())
    }

    pub async fn search(&mut self, term: &str) -> Result<()> {
        let home = self.home()?;
        let results = home.search_for(term).await?;
        self.results = Some(results);
        Ok(())
    }

    pub async fn expect_results(&self) -> Result<()> {
        let results = self.results_page()?;
        let term = results.term();

        check(
            results.results_title_visible().await,
            "Results title should be visible",
            "visible",
            "not visible",
        )?;
        check(
            results.has_results().await,
            &format!("Search for '{}' should return products", term),
            "at least one product",
            results.first_product_title().await,
        )?;
        if results.echoes_search_term() {
            let echo = results.search_term_echo_text().await;
            check(
                contains_ignore_case(&echo, term),
                "Searched term should be echoed on the results page",
                term,
                &echo,
            )?;
        }
        Ok(())
    }

    pub async fn expect_more_than(&self, minimum: usize) -> Result<()> {
        let results = self.results_page()?;
        let count = results.results_count().await;
        check(
            count > minimum,
            "Not enough products listed",
            format!("more than {}", minimum),
            count,
        )
    }

    /// The no-results message contains `expected` and names the searched term
    pub async fn expect_no_results(&self, expected: &str) -> Result<()> {
        let results = self.results_page()?;
        let term = results.term();
        let message = results.no_results_message_text().await;

        check(
            contains_ignore_case(&message, expected),
            "No-results message not shown",
            expected,
            &message,
        )?;

        if results.store().catalog().results.no_results_term.is_some() {
            let shown = results.no_results_term_text().await;
            check(
                shown.eq_ignore_ascii_case(term),
                "No-results message should name the searched term",
                term,
                &shown,
            )
        } else {
            let quoted = format!("\"{}\"", term);
            check(
                contains_ignore_case(&message, &quoted),
                "No-results message should name the searched term",
                &quoted,
                &message,
            )
        }
    }

    pub async fn expect_first_result_contains(&self, term: &str) -> Result<()> {
        let results = self.results_page()?;
        let title = results.first_product_title().await;
        check(
            contains_ignore_case(&title, term),
            "First product title does not match the search",
            term,
            &title,
        )
    }

    pub async fn click_option(&self, name: &str) -> Result<()> {
        if !is_deals_keyword(name) {
            return Err(StorecheckError::Contract {
                kind: "option",
                value: name.to_string(),
            }
            .into());
        }
        self.home()?.open_deals().await
    }

    pub async fn expect_page(&self, name: &str) -> Result<()> {
        if !is_deals_keyword(name) {
            return Err(StorecheckError::Contract {
                kind: "page",
                value: name.to_string(),
            }
            .into());
        }
        let home = self.home()?;
        let expected = home.expected_deals_heading();
        check(
            home.deals_page_visible().await,
            &format!("{} page should be displayed", name),
            expected,
            "heading not visible",
        )?;
        let heading = home.deals_heading_text().await;
        check(
            heading == expected,
            "Deals page heading does not match",
            expected,
            &heading,
        )
    }

    pub async fn expect_deals_listed(&self) -> Result<()> {
        let count = self.home()?.deals_count().await;
        check(count > 0, "No deals listed", "at least one deal", count)
    }

    pub fn expect_readiness_confirmed(&self) -> Result<()> {
        let state = self.results_page()?.readiness();
        check(
            state.is_confirmed(),
            "Results page did not settle into a known state",
            "confirmed",
            state,
        )
    }

    fn home(&self) -> Result<&HomePage<'c, S>> {
        self.home
            .as_ref()
            .ok_or_else(|| anyhow!("No store is open; open a store first"))
    }

    fn results_page(&self) -> Result<&ResultsPage<'c, S>> {
        self.results
            .as_ref()
            .ok_or_else(|| anyhow!("No search has been made; search first"))
    }
}

#[cfg(test)]
#[path = "steps_test.rs"]
mod steps_test;
