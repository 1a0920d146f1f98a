//! Portfolio source trait and built-in sources.
//!
//! A source knows how to read one portfolio listing and one company detail
//! page from the portfolio website. The page-data JSON source is the primary
//! one; the HTML source reads the rendered pages and yields the same records
//! at lower fidelity.

mod html;
mod page_data;

use std::time::Duration;

use async_trait::async_trait;
use portfolio_shared::{
    CompanyDetail, CompanySummary, Portfolio, PortfolioError, Result, SourceConfig,
};
use reqwest::Client;

pub use html::{HtmlSource, parse_detail_html, parse_listing_html};
pub use page_data::{
    PageDataSource, RawBlock, description_from_body, fetch_detail, fetch_listing, parse_detail,
    parse_listing,
};

/// User-Agent string for portfolio requests.
const USER_AGENT: &str = concat!("portfolio-harvester/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A place portfolio listings and company details can be read from.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    /// Fetch every company summary of `portfolio`, in listing order.
    ///
    /// Fails with [`PortfolioError::SourceUnavailable`]; there is no partial listing.
    async fn fetch_listing(&self, portfolio: Portfolio) -> Result<Vec<CompanySummary>>;

    /// Fetch the detail page at the site-relative `path`.
    ///
    /// `None` when the page is missing or unreadable; never fails the caller.
    async fn fetch_detail(&self, path: &str) -> Option<CompanyDetail>;

    /// Human-readable source name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings shared by the built-in sources.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Site origin, without trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl From<&SourceConfig> for SourceOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &SourceOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| PortfolioError::Network(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_strip_trailing_slash() {
        let config = SourceConfig {
            base_url: "https://eqtgroup.com/".into(),
            timeout_secs: 5,
        };
        let opts = SourceOptions::from(&config);
        assert_eq!(opts.base_url, "https://eqtgroup.com");
        assert_eq!(opts.timeout_secs, 5);
    }
}
