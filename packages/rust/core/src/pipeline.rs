//! End-to-end harvest: listing → detail fan-out → reference join →
//! funding rounds → result file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use portfolio_crawler::{
    FanOutProgress, HtmlSource, PageDataSource, PortfolioSource, SourceOptions,
    default_concurrency, enrich_all,
};
use portfolio_datasets::{DatasetStore, load_funding_rounds, load_organizations};
use portfolio_shared::{AppConfig, DatasetsConfig, EnrichedRecord, Portfolio, Result};

use crate::join::{attach_funding_rounds, join};
use crate::output::write_results;

/// Runtime configuration for [`run_harvest`].
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Portfolio website connection settings.
    pub source: SourceOptions,
    /// Read the rendered HTML pages instead of the page-data JSON.
    pub use_html: bool,
    /// Listings to harvest, concatenated in this order.
    pub portfolios: Vec<Portfolio>,
    /// Maximum concurrent detail requests.
    pub concurrency: usize,
    /// Dataset locations.
    pub datasets: DatasetsConfig,
    /// Leave out funding rounds entirely.
    pub skip_funding_rounds: bool,
    /// Directory receiving the result file.
    pub output_dir: PathBuf,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            source: SourceOptions::from(&config.source),
            use_html: false,
            portfolios: Portfolio::ALL.to_vec(),
            concurrency: config.fetch.concurrency.unwrap_or_else(default_concurrency),
            datasets: config.datasets.clone(),
            skip_funding_rounds: false,
            output_dir: PathBuf::from(&config.output.dir),
        }
    }
}

/// Result of a harvest run.
#[derive(Debug)]
pub struct HarvestResult {
    /// Path of the result file.
    pub output_path: PathBuf,
    /// Number of company records written.
    pub company_count: usize,
    /// Records that matched a reference organization.
    pub matched_count: usize,
    /// Funding rounds attached across all records.
    pub funding_round_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each company's detail is resolved, in listing order.
    fn detail_resolved(&self, title: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &HarvestResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn detail_resolved(&self, _title: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &HarvestResult) {}
}

/// Build the configured portfolio source.
pub fn build_source(config: &HarvestConfig) -> Result<Arc<dyn PortfolioSource>> {
    if config.use_html {
        Ok(Arc::new(HtmlSource::new(&config.source)?))
    } else {
        Ok(Arc::new(PageDataSource::new(&config.source)?))
    }
}

/// Run the full harvest pipeline.
///
/// 1. Fetch each selected listing (any failure aborts the run)
/// 2. Fetch company details concurrently
/// 3. Load and deduplicate reference organizations, then left-join
/// 4. Attach funding rounds (unless skipped)
/// 5. Write the result file
#[instrument(skip_all, fields(portfolios = ?config.portfolios, concurrency = config.concurrency))]
pub async fn run_harvest(
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
) -> Result<HarvestResult> {
    let start = Instant::now();
    let source = build_source(config)?;
    let store = DatasetStore::from_config(&config.datasets, config.source.timeout_secs)?;

    info!(source = source.name(), "starting harvest");

    let records = harvest(source, &store, config, progress).await?;

    // --- Phase 5: Output ---
    progress.phase("Writing results");
    let output_path = write_results(&config.output_dir, &records)?;

    let result = HarvestResult {
        output_path,
        company_count: records.len(),
        matched_count: records.iter().filter(|r| r.organization.is_some()).count(),
        funding_round_count: records
            .iter()
            .filter_map(|r| r.funding_rounds.as_ref())
            .map(Vec::len)
            .sum(),
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        companies = result.company_count,
        matched = result.matched_count,
        funding_rounds = result.funding_round_count,
        path = %result.output_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "harvest complete"
    );

    Ok(result)
}

/// Produce the enriched records from `source` and the datasets in `store`.
pub async fn harvest(
    source: Arc<dyn PortfolioSource>,
    store: &DatasetStore,
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
) -> Result<Vec<EnrichedRecord>> {
    // --- Phase 1: Listings ---
    let mut summaries = Vec::new();
    for portfolio in &config.portfolios {
        progress.phase(&format!("Fetching {portfolio} portfolio"));
        let listing = source.fetch_listing(*portfolio).await?;
        info!(%portfolio, companies = listing.len(), "listing fetched");
        summaries.extend(listing);
    }

    if summaries.is_empty() {
        warn!("listings contained no companies");
    }

    // --- Phase 2: Details ---
    progress.phase("Fetching company details");
    let fan_out = PipelineFanOutProgress { inner: progress };
    let companies = enrich_all(source, summaries, config.concurrency, &fan_out).await;

    // --- Phase 3: Reference organizations ---
    progress.phase("Loading reference organizations");
    let orgs = load_organizations(store, &config.datasets).await?;
    let joined = join(companies, &orgs);

    if config.skip_funding_rounds {
        return Ok(joined);
    }

    // --- Phase 4: Funding rounds ---
    progress.phase("Loading funding rounds");
    let rounds = load_funding_rounds(store, &config.datasets).await?;
    Ok(attach_funding_rounds(joined, &rounds))
}

// ---------------------------------------------------------------------------
// Fan-out progress adapter
// ---------------------------------------------------------------------------

/// Adapts a `ProgressReporter` to the `FanOutProgress` interface.
struct PipelineFanOutProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl FanOutProgress for PipelineFanOutProgress<'_> {
    fn detail_resolved(&self, title: &str, current: usize, total: usize) {
        self.inner.detail_resolved(title, current, total);
    }
}
