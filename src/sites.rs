//! Selector catalogs for the supported stores

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::StorecheckError;
use crate::locator::Locator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Amazon,
    Magalu,
}

impl Store {
    /// Configuration key prefix (`amazon.url`)
    pub fn key(&self) -> &'static str {
        match self {
            Store::Amazon => "amazon",
            Store::Magalu => "magalu",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Store::Amazon => "Amazon",
            Store::Magalu => "Magazine Luiza",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Store::Amazon => "https://www.amazon.com.br",
            Store::Magalu => "https://www.magazineluiza.com.br",
        }
    }

    /// Host fragment the current URL must contain once the home page is open
    pub fn host(&self) -> &'static str {
        match self {
            Store::Amazon => "amazon.com.br",
            Store::Magalu => "magazineluiza.com.br",
        }
    }

    pub fn catalog(&self) -> &'static StoreCatalog {
        match self {
            Store::Amazon => &AMAZON,
            Store::Magalu => &MAGALU,
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Store {
    type Err = StorecheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amazon" => Ok(Store::Amazon),
            "magalu" | "magazine luiza" | "magazineluiza" => Ok(Store::Magalu),
            _ => Err(StorecheckError::Contract {
                kind: "store",
                value: s.to_string(),
            }),
        }
    }
}

/// Home page selectors
#[derive(Debug)]
pub struct HomeCatalog {
    pub search_input: Locator,
    pub search_button: Locator,
    /// Cookie banner accepted on open, if the store shows one
    pub consent_button: Option<Locator>,
    pub deals_link: Locator,
    /// Heading that identifies the deals page
    pub deals_heading: Locator,
    pub deals_heading_text: &'static str,
    /// Items listed on the deals page
    pub deals_items: Locator,
}

/// Search results page selectors
#[derive(Debug)]
pub struct ResultsCatalog {
    pub results_title: Locator,
    pub empty_message: Locator,
    /// Text the no-results message is expected to contain
    pub empty_message_text: &'static str,
    pub product_titles: Locator,
    /// Element echoing the searched term, where the store has one
    pub search_term_echo: Option<Locator>,
    /// Searched term shown next to the no-results message
    pub no_results_term: Option<Locator>,
}

#[derive(Debug)]
pub struct StoreCatalog {
    pub home: HomeCatalog,
    pub results: ResultsCatalog,
}

pub static AMAZON: StoreCatalog = StoreCatalog {
    home: HomeCatalog {
        search_input: Locator::id("twotabsearchtextbox"),
        search_button: Locator::id("nav-search-submit-button"),
        consent_button: Some(Locator::id("sp-cc-accept")),
        deals_link: Locator::xpath(
            "//a[@href='/deals?ref_=nav_cs_gb' and normalize-space(.)='Ofertas do Dia']",
        ),
        deals_heading: Locator::xpath("//h1[normalize-space(.)='Ofertas e Promoções']"),
        deals_heading_text: "Ofertas e Promoções",
        deals_items: Locator::xpath(
            "//*[@id=\"DealsGridScrollAnchor\"]/div[3]/div/div/div[2]/div[1]/div/div",
        ),
    },
    results: ResultsCatalog {
        results_title: Locator::xpath("//h2[normalize-space(.)='Resultados']"),
        empty_message: Locator::xpath(
            "//div[@class='s-no-outline']//span[contains(text(),'Nenhum resultado para')]",
        ),
        empty_message_text: "Nenhum resultado para",
        product_titles: Locator::xpath(
            "//div[contains(@data-cel-widget, 'search_result_')]//h2/a/span[normalize-space(.)!='' and not(contains(@class, 'a-offscreen'))]",
        ),
        search_term_echo: Some(Locator::css(".a-color-state.a-text-bold")),
        no_results_term: Some(Locator::xpath(
            "//div[@class='s-no-outline']//span[contains(text(),'Nenhum resultado para')]/following-sibling::span[1]",
        )),
    },
};

pub static MAGALU: StoreCatalog = StoreCatalog {
    home: HomeCatalog {
        search_input: Locator::id("input-search"),
        search_button: Locator::css("button[data-testid='search-submit']"),
        consent_button: None,
        deals_link: Locator::css("a[data-testid='link'][href='/selecao/ofertasdodia/']"),
        deals_heading: Locator::css("h1[data-testid='main-title'][title='Aproveite!']"),
        deals_heading_text: "Aproveite!",
        deals_items: Locator::css(
            "[data-testid='product-card-content'] [data-testid='product-title']",
        ),
    },
    results: ResultsCatalog {
        results_title: Locator::css("span[data-testid='main-title'][title='Resultados para ']"),
        empty_message: Locator::css("h1[data-testid='text-list-title']"),
        empty_message_text: "não encontrou resultado algum",
        product_titles: Locator::css(
            "[data-testid='product-card-content'] [data-testid='product-title']",
        ),
        search_term_echo: None,
        no_results_term: None,
    },
};

#[cfg(test)]
#[path = "sites_test.rs"]
mod sites_test;
