//! Portfolio acquisition: listing/detail sources and the detail fan-out.
//!
//! This crate provides:
//! - [`sources`]: [`PortfolioSource`] implementations (page-data JSON, rendered HTML)
//! - [`engine`]: bounded, order-preserving detail fan-out ([`enrich_all`])

pub mod engine;
pub mod sources;

pub use engine::{FanOutProgress, SilentFanOut, default_concurrency, enrich_all};
pub use sources::{HtmlSource, PageDataSource, PortfolioSource, SourceOptions};
