//! Rendered-HTML source.
//!
//! Reads the human-facing listing table and company pages. Produces the same
//! records as the page-data source, minus what the markup does not show
//! (board, management, logo).

use std::sync::LazyLock;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use portfolio_shared::{
    CompanyDetail, CompanySummary, Portfolio, PortfolioError, Result, normalize_domain,
};

use super::{PortfolioSource, SourceOptions, build_client};

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.items-center").expect("row selector"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.flex-1").expect("cell selector"));
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("link selector"));
static LEFT_COLUMN_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#gatsby-focus-wrapper > main > div:nth-of-type(1)")
        .expect("left column selector")
});
static DESCRIPTION_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#gatsby-focus-wrapper > main > div:nth-of-type(4)")
        .expect("description selector")
});
static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2.font-h3").expect("heading selector"));
static PREAMBLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.font-preamble").expect("preamble selector"));
static FACT_ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.flex").expect("fact row selector"));
static FACT_CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.flex-1").expect("fact cell selector"));
static PARAGRAPH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.font-body").expect("paragraph selector"));

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the portfolio table of a listing page.
///
/// Rows with fewer than five cells are not company rows and are skipped.
pub fn parse_listing_html(body: &str) -> Vec<CompanySummary> {
    let doc = Html::parse_document(body);
    let mut summaries = Vec::new();

    for row in doc.select(&ROW_SEL) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL_SEL).collect();
        if cells.len() <= 4 {
            continue;
        }

        let cell = |i: usize| cells.get(i).map(|c| text_of(*c).trim().to_string());
        let fund = cell(3).and_then(non_empty).into_iter().collect();
        let detail_path = cells[0]
            .select(&LINK_SEL)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_owned);

        summaries.push(CompanySummary {
            title: cell(0).unwrap_or_default(),
            sector: cell(1).and_then(non_empty),
            country: cell(2).and_then(non_empty),
            fund,
            entry_date: cell(4).and_then(non_empty),
            exit_date: cell(5).and_then(non_empty),
            detail_path,
        });
    }

    summaries
}

/// Parse a rendered company page. `None` when the page has no content column.
pub fn parse_detail_html(body: &str) -> Option<CompanyDetail> {
    let doc = Html::parse_document(body);
    let left = doc.select(&LEFT_COLUMN_SEL).next()?;

    let mut detail = CompanyDetail {
        heading: left
            .select(&HEADING_SEL)
            .next()
            .map(|h| text_of(h).trim().to_string()),
        preamble: left
            .select(&PREAMBLE_SEL)
            .next()
            .map(|p| text_of(p).trim().to_string()),
        ..Default::default()
    };

    for fact in left.select(&FACT_ROW_SEL) {
        let parts: Vec<ElementRef<'_>> = fact.select(&FACT_CELL_SEL).collect();
        if parts.len() < 2 {
            continue;
        }

        let key = text_of(parts[0]).trim().to_lowercase().replace(' ', "_");
        let value = text_of(parts[1]).trim().to_string();

        match key.as_str() {
            "website" => detail.website = non_empty(value),
            k if k.contains("advisor") => detail.responsible_advisors.push(value),
            other => debug!(key = other, "ignoring company fact"),
        }
    }

    // Paragraphs run together, matching the page-data description text.
    detail.description = doc
        .select(&DESCRIPTION_SEL)
        .next()
        .map(|d| d.select(&PARAGRAPH_SEL).map(text_of).collect::<String>());

    detail.registered_domain = normalize_domain(detail.website.as_deref());
    Some(detail)
}

// ---------------------------------------------------------------------------
// HtmlSource
// ---------------------------------------------------------------------------

/// Reads the portfolio from the rendered website pages.
pub struct HtmlSource {
    client: Client,
    base_url: String,
}

impl HtmlSource {
    /// Create a source for the site at `opts.base_url`.
    pub fn new(opts: &SourceOptions) -> Result<Self> {
        Ok(Self {
            client: build_client(opts)?,
            base_url: opts.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        response
            .text()
            .await
            .map_err(|e| format!("body read failed: {e}"))
    }
}

#[async_trait]
impl PortfolioSource for HtmlSource {
    #[instrument(skip(self))]
    async fn fetch_listing(&self, portfolio: Portfolio) -> Result<Vec<CompanySummary>> {
        let url = format!("{}{}", self.base_url, portfolio.listing_path());

        let body = self
            .get_text(&url)
            .await
            .map_err(|reason| PortfolioError::source_unavailable(&url, reason))?;

        let summaries = parse_listing_html(&body);
        if summaries.is_empty() {
            return Err(PortfolioError::source_unavailable(
                &url,
                "no portfolio rows found in page",
            ));
        }

        info!(companies = summaries.len(), "listing scraped");
        Ok(summaries)
    }

    async fn fetch_detail(&self, path: &str) -> Option<CompanyDetail> {
        let url = format!("{}{path}", self.base_url);

        let body = match self.get_text(&url).await {
            Ok(body) => body,
            Err(reason) => {
                debug!(error = %PortfolioError::detail_unavailable(path, reason), "detail unavailable");
                return None;
            }
        };

        let detail = parse_detail_html(&body);
        if detail.is_none() {
            debug!(%path, "company page has no content column");
        }
        detail
    }

    fn name(&self) -> &str {
        "html"
    }
}
