//! Data module - CSV loading, typed records and bucketing

mod bucket;
mod loader;
mod record;

pub use bucket::{bucket, bucket_optional, GamesPlayedBucket};
pub use loader::{
    parse_csv, DatasetCache, Fetcher, HttpFetcher, Loader, LoaderError, LoaderOptions,
    DEFAULT_TIMESTAMP_COLUMN,
};
pub use record::{parse_timestamp, Dataset, Record};
