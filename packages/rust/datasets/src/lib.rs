//! Reference datasets: organizations and funding rounds.
//!
//! This crate provides:
//! - [`store`]: [`DatasetStore`] for remote bucket or local directory objects,
//!   with gzip detection and JSON-lines decoding
//! - [`orgs`]: organization cleanup and deduplication ([`load_and_dedupe`])

pub mod orgs;
pub mod store;

pub use orgs::load_and_dedupe;
pub use store::{DatasetStore, decompress, parse_json_lines};

use portfolio_shared::{DatasetsConfig, FundingRoundRow, OrgRow, ReferenceOrg, Result};

/// Load the organization dataset named in `config` and clean it.
pub async fn load_organizations(
    store: &DatasetStore,
    config: &DatasetsConfig,
) -> Result<Vec<ReferenceOrg>> {
    let rows: Vec<OrgRow> = store.load_rows(&config.organizations).await?;
    Ok(load_and_dedupe(rows))
}

/// Load the funding-round dataset named in `config`.
pub async fn load_funding_rounds(
    store: &DatasetStore,
    config: &DatasetsConfig,
) -> Result<Vec<FundingRoundRow>> {
    store.load_rows(&config.funding_rounds).await
}
