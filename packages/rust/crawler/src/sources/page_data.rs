//! Page-data JSON source.
//!
//! The portfolio site publishes a `page-data.json` document per page. The
//! listing lives at `result.data.allSanityCompanyPage.nodes`, a company page
//! at `result.data.sanityCompanyPage`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use portfolio_shared::{
    CompanyDetail, CompanySummary, PersonRole, Portfolio, PortfolioError, Result,
    normalize_domain,
};

use super::{PortfolioSource, SourceOptions, build_client};

/// JSON pointer to the listing nodes inside the page-data envelope.
const LISTING_POINTER: &str = "/result/data/allSanityCompanyPage/nodes";

/// JSON pointer to a company document inside the page-data envelope.
const DETAIL_POINTER: &str = "/result/data/sanityCompanyPage";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListingNode {
    title: Option<String>,
    sector: Option<String>,
    country: Option<String>,
    fund: Option<Vec<RawTitled>>,
    entry_date: Option<String>,
    exit_date: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTitled {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompanyDetail {
    #[serde(rename = "_rawBody")]
    raw_body: Option<Vec<RawBlock>>,
    preamble: Option<String>,
    heading: Option<String>,
    responsible_advisors: Option<Vec<RawTitled>>,
    website: Option<String>,
    board: Option<Vec<PersonRole>>,
    management: Option<Vec<PersonRole>>,
    logo: Option<RawLogo>,
}

/// A rich-text block of the company body.
#[derive(Debug, Deserialize)]
pub struct RawBlock {
    children: Option<Vec<RawSpan>>,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLogo {
    asset: Option<RawAsset>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    url: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract and validate the listing nodes of a page-data document.
///
/// Errors carry a plain reason; the caller attaches the URL.
pub fn parse_listing(body: &Value) -> std::result::Result<Vec<CompanySummary>, String> {
    let nodes = body
        .pointer(LISTING_POINTER)
        .ok_or_else(|| "missing result.data.allSanityCompanyPage.nodes".to_string())?;

    let nodes: Vec<RawListingNode> =
        serde_json::from_value(nodes.clone()).map_err(|e| format!("malformed listing node: {e}"))?;

    nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| {
            let title = node
                .title
                .ok_or_else(|| format!("listing node {i} has no title"))?;
            Ok(CompanySummary {
                title,
                sector: node.sector,
                country: node.country,
                fund: node
                    .fund
                    .unwrap_or_default()
                    .into_iter()
                    .map(|f| f.title.unwrap_or_default())
                    .collect(),
                entry_date: node.entry_date,
                exit_date: node.exit_date,
                detail_path: node.path,
            })
        })
        .collect()
}

/// Turn a `sanityCompanyPage` document into a [`CompanyDetail`].
///
/// `null`, `{}` and non-object payloads are rejected.
pub fn parse_detail(payload: &Value) -> std::result::Result<CompanyDetail, String> {
    match payload.as_object() {
        Some(doc) if !doc.is_empty() => {}
        Some(_) => return Err("empty company document".into()),
        None => return Err(format!("expected a company document, got {payload}")),
    }

    let raw: RawCompanyDetail = serde_json::from_value(payload.clone())
        .map_err(|e| format!("malformed company document: {e}"))?;

    let registered_domain = normalize_domain(raw.website.as_deref());

    Ok(CompanyDetail {
        description: description_from_body(raw.raw_body.as_deref()),
        preamble: raw.preamble,
        heading: raw.heading,
        responsible_advisors: raw
            .responsible_advisors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.title)
            .collect(),
        website: raw.website,
        registered_domain,
        board: raw.board.unwrap_or_default(),
        management: raw.management.unwrap_or_default(),
        logo_url: raw.logo.and_then(|l| l.asset).and_then(|a| a.url),
    })
}

/// Concatenate the text of every span of every block, with no separator.
///
/// Adjacent blocks run together (`"...services.Market trends"`); existing
/// result files depend on that exact text.
pub fn description_from_body(blocks: Option<&[RawBlock]>) -> Option<String> {
    let blocks = blocks.filter(|b| !b.is_empty())?;

    let mut description = String::new();
    for block in blocks {
        for span in block.children.iter().flatten() {
            if let Some(text) = &span.text {
                description.push_str(text);
            }
        }
    }
    Some(description)
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetch a portfolio listing. Any failure is [`PortfolioError::SourceUnavailable`].
#[instrument(skip(client))]
pub async fn fetch_listing(client: &Client, url: &str) -> Result<Vec<CompanySummary>> {
    let unavailable = |reason: String| PortfolioError::source_unavailable(url, reason);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("HTTP {status}")));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| unavailable(format!("invalid JSON: {e}")))?;

    let summaries = parse_listing(&body).map_err(unavailable)?;
    info!(companies = summaries.len(), "listing fetched");
    Ok(summaries)
}

/// Fetch one company page-data document. Any failure is
/// [`PortfolioError::DetailUnavailable`].
pub async fn fetch_detail(client: &Client, url: &str, path: &str) -> Result<CompanyDetail> {
    let unavailable = |reason: String| PortfolioError::detail_unavailable(path, reason);

    debug!(%url, "fetching company details");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("HTTP {status}")));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| unavailable(format!("invalid JSON: {e}")))?;

    let payload = body
        .pointer(DETAIL_POINTER)
        .ok_or_else(|| unavailable("missing result.data.sanityCompanyPage".into()))?;

    parse_detail(payload).map_err(unavailable)
}

// ---------------------------------------------------------------------------
// PageDataSource
// ---------------------------------------------------------------------------

/// Reads the portfolio from the site's `page-data.json` documents.
pub struct PageDataSource {
    client: Client,
    base_url: String,
}

impl PageDataSource {
    /// Create a source for the site at `opts.base_url`.
    pub fn new(opts: &SourceOptions) -> Result<Self> {
        Ok(Self {
            client: build_client(opts)?,
            base_url: opts.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Page-data URL of a listing.
    pub fn listing_url(&self, portfolio: Portfolio) -> String {
        format!(
            "{}/page-data{}page-data.json",
            self.base_url,
            portfolio.listing_path()
        )
    }

    /// Page-data URL of a company page.
    pub fn detail_url(&self, path: &str) -> String {
        format!("{}/page-data{path}page-data.json", self.base_url)
    }
}

#[async_trait]
impl PortfolioSource for PageDataSource {
    async fn fetch_listing(&self, portfolio: Portfolio) -> Result<Vec<CompanySummary>> {
        fetch_listing(&self.client, &self.listing_url(portfolio)).await
    }

    async fn fetch_detail(&self, path: &str) -> Option<CompanyDetail> {
        match fetch_detail(&self.client, &self.detail_url(path), path).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                debug!(error = %e, "detail unavailable");
                None
            }
        }
    }

    fn name(&self) -> &str {
        "page-data"
    }
}
