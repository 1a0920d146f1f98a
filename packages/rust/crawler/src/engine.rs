//! Bounded, order-preserving detail fan-out.
//!
//! Every summary with a detail path gets its own task; a semaphore caps how
//! many run at once. Handles are awaited in listing order, so `records[i]`
//! always comes from `summaries[i]` whatever order the fetches finish in.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use portfolio_shared::{CompanyDetail, CompanyRecord, CompanySummary};

use crate::sources::PortfolioSource;

/// One worker per logical core, falling back to a single worker.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Receives one call per summary as its detail is resolved, in listing order.
pub trait FanOutProgress: Send + Sync {
    fn detail_resolved(&self, title: &str, current: usize, total: usize);
}

/// No-op progress for headless/test usage.
pub struct SilentFanOut;

impl FanOutProgress for SilentFanOut {
    fn detail_resolved(&self, _title: &str, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Fetch the detail page of every summary and merge it into a [`CompanyRecord`].
///
/// Summaries without a detail path are passed through without a request.
/// A missing detail or a failed task leaves that record summary-only; the
/// batch itself never fails and always returns `summaries.len()` records.
#[instrument(
    skip_all,
    fields(source = source.name(), companies = summaries.len(), concurrency = concurrency)
)]
pub async fn enrich_all(
    source: Arc<dyn PortfolioSource>,
    summaries: Vec<CompanySummary>,
    concurrency: usize,
    progress: &dyn FanOutProgress,
) -> Vec<CompanyRecord> {
    let start = Instant::now();
    let total = summaries.len();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let pending: Vec<(CompanySummary, Option<JoinHandle<Option<CompanyDetail>>>)> = summaries
        .into_iter()
        .map(|summary| {
            let handle = summary.detail_path.clone().map(|path| {
                let source = source.clone();
                let sem = semaphore.clone();
                tokio::spawn(async move {
                    let _permit = sem.acquire().await.ok()?;
                    source.fetch_detail(&path).await
                })
            });
            (summary, handle)
        })
        .collect();

    let mut records = Vec::with_capacity(total);
    let mut with_detail = 0usize;
    let mut without_path = 0usize;

    for (i, (summary, handle)) in pending.into_iter().enumerate() {
        let detail = match handle {
            None => {
                debug!(title = %summary.title, "no detail path, skipping detail fetch");
                without_path += 1;
                None
            }
            Some(handle) => match handle.await {
                Ok(Some(detail)) => Some(detail),
                Ok(None) => {
                    info!(title = %summary.title, "no details could be found");
                    None
                }
                Err(e) => {
                    warn!(title = %summary.title, error = %e, "detail task failed");
                    None
                }
            },
        };

        if detail.is_some() {
            with_detail += 1;
        }
        progress.detail_resolved(&summary.title, i + 1, total);
        records.push(CompanyRecord { summary, detail });
    }

    info!(
        companies = total,
        with_detail,
        without_detail = total - with_detail - without_path,
        without_path,
        elapsed_ms = start.elapsed().as_millis(),
        "detail fan-out complete"
    );

    records
}
