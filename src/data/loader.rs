//! CSV Data Loader Module
//! Fetches the event CSV, parses it with Polars and memoizes the typed dataset per URL.

use crate::data::record::{
    Dataset, RawRow, DOLLARS_SPENT_COLUMN, GAMES_PLAYED_COLUMN, ITEMS_CRAFTED_COLUMN,
    PLATFORM_COLUMN, REGION_COLUMN, SKILL_LAST_COLUMN,
};
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Column holding the event timestamp in the provider's CSV.
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "Date";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to retrieve {url}: {reason}")]
    Retrieval { url: String, reason: String },
    #[error("Failed to parse CSV: {0}")]
    Parse(String),
    #[error("Column '{column}' row {row}: cannot convert '{value}'")]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
    },
}

/// Retrieves raw bytes for a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoaderError>;
}

/// Fetches over HTTP(S) with a blocking client; `file://` URLs and bare
/// paths are read from disk.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    fn read_local(url: &str, path: &Path) -> Result<Vec<u8>, LoaderError> {
        std::fs::read(path).map_err(|e| LoaderError::Retrieval {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoaderError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Self::read_local(url, Path::new(path));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Self::read_local(url, Path::new(url));
        }

        let retrieval = |e: reqwest::Error| LoaderError::Retrieval {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(retrieval)?;
        let bytes = response.bytes().map_err(retrieval)?;
        Ok(bytes.to_vec())
    }
}

/// Write-once, read-many cache of loaded datasets keyed by source URL.
/// Entries are never evicted.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<String, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Arc<Dataset>> {
        self.lock().get(url).cloned()
    }

    /// Store a dataset unless one is already cached for `url`; returns the
    /// cached entry either way so racing first loads agree on one value.
    pub fn insert(&self, url: &str, dataset: Dataset) -> Arc<Dataset> {
        self.lock()
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(dataset))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Dataset>>> {
        // A poisoned map still holds complete entries; inserts are atomic.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Parsing options for the provider's CSV.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub timestamp_column: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
        }
    }
}

/// Loads and normalizes the event dataset, memoizing by URL.
pub struct Loader<F: Fetcher> {
    fetcher: F,
    cache: Arc<DatasetCache>,
    options: LoaderOptions,
}

impl<F: Fetcher> Loader<F> {
    pub fn new(fetcher: F, cache: Arc<DatasetCache>) -> Self {
        Self::with_options(fetcher, cache, LoaderOptions::default())
    }

    pub fn with_options(fetcher: F, cache: Arc<DatasetCache>, options: LoaderOptions) -> Self {
        Self {
            fetcher,
            cache,
            options,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Load the dataset for `url`, returning the cached copy when present.
    pub fn load(&self, url: &str) -> Result<Arc<Dataset>, LoaderError> {
        if let Some(dataset) = self.cache.get(url) {
            debug!("Dataset cache hit for {}", url);
            return Ok(dataset);
        }

        debug!("Dataset cache miss for {}, fetching", url);
        let bytes = self.fetcher.fetch(url)?;
        let dataset = parse_csv(bytes, &self.options)?;
        info!("Loaded {} rows from {}", dataset.len(), url);

        Ok(self.cache.insert(url, dataset))
    }
}

/// Parse CSV bytes into a typed [`Dataset`].
///
/// Every column is read as text so coercion failures surface per cell with
/// the offending value instead of being swallowed by schema inference.
pub fn parse_csv(bytes: Vec<u8>, options: &LoaderOptions) -> Result<Dataset, LoaderError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| LoaderError::Parse(e.to_string()))?;

    let ts_col = options.timestamp_column.as_str();
    let required = [
        ts_col,
        PLATFORM_COLUMN,
        REGION_COLUMN,
        GAMES_PLAYED_COLUMN,
        SKILL_LAST_COLUMN,
        ITEMS_CRAFTED_COLUMN,
        DOLLARS_SPENT_COLUMN,
    ];

    let mut columns: Vec<&StringChunked> = Vec::with_capacity(required.len());
    for name in required {
        let column = df
            .column(name)
            .map_err(|_| LoaderError::Parse(format!("missing required column '{}'", name)))?;
        let text = column
            .as_materialized_series()
            .str()
            .map_err(|e| LoaderError::Parse(e.to_string()))?;
        columns.push(text);
    }

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let raw = RawRow {
            timestamp: columns[0].get(i),
            platform: columns[1].get(i),
            region: columns[2].get(i),
            games_played: columns[3].get(i),
            skill_last: columns[4].get(i),
            items_crafted: columns[5].get(i),
            dollars_spent: columns[6].get(i),
        };
        records.push(raw.coerce(ts_col, i + 1)?);
    }

    Ok(Dataset::new(records))
}
