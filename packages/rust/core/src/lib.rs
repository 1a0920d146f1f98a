//! Harvest pipeline orchestration for the portfolio harvester.
//!
//! This crate ties together the listing/detail sources, the reference
//! datasets, the organization join, and the result writer into
//! [`run_harvest`].

pub mod join;
pub mod output;
pub mod pipeline;

pub use join::{attach_funding_rounds, join};
pub use output::{result_file_name, to_pretty_json, write_results};
pub use pipeline::{
    HarvestConfig, HarvestResult, ProgressReporter, SilentProgress, build_source, harvest,
    run_harvest,
};
