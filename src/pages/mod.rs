//! Page objects for the store home and search results pages.
//!
//! Both borrow a [`SyncContext`](crate::context::SyncContext) and own their
//! element handles, so a handle never outlives the session it was bound in.

mod home;
mod results;

pub use home::HomePage;
pub use results::ResultsPage;

use tracing::warn;

/// Placeholders returned by queries that could not read the page
pub mod placeholder {
    pub const NO_PRODUCT_TITLE: &str = "No product title found.";
    pub const NO_RESULTS_TITLE: &str = "Results title not found.";
    pub const NO_EMPTY_MESSAGE: &str = "No-results message not found.";
    pub const NO_SEARCHED_TERM: &str = "Searched term not found.";
    pub const NO_TERM_ECHO: &str = "Search term echo not found.";
    pub const NO_DEALS_HEADING: &str = "Deals heading not found.";
}

/// Unwrap a query result, logging the failure and falling back to `default`
fn degrade<T>(query: &str, result: anyhow::Result<T>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} failed, using placeholder: {:#}", query, e);
            default
        }
    }
}
