//! Shared types, error model, and configuration for the portfolio harvester.
//!
//! This crate is the foundation depended on by all other harvester crates.
//! It provides:
//! - [`PortfolioError`]: the unified error type
//! - Record types ([`CompanySummary`], [`CompanyDetail`], [`CompanyRecord`],
//!   [`ReferenceOrg`], [`FundingRound`], [`EnrichedRecord`])
//! - [`normalize_domain`]: the registrable-domain join key
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod domain;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatasetsConfig, FetchConfig, OutputConfig, SourceConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use domain::normalize_domain;
pub use error::{PortfolioError, Result};
pub use types::{
    CompanyDetail, CompanyRecord, CompanySummary, EnrichedRecord, FundingRound, FundingRoundRow,
    OrgRow, PersonRole, Portfolio, ReferenceOrg,
};
