//! Event Insights - in-game event engagement & spending analysis
//!
//! Loads a player activity CSV, buckets players by games played, cuts the
//! data into two promotional event windows and produces density curves,
//! segment comparisons and a region x platform mean spend table.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;

pub use config::ReportConfig;
pub use data::{Dataset, DatasetCache, Fetcher, HttpFetcher, Loader, LoaderError, Record};
pub use report::EventReport;
