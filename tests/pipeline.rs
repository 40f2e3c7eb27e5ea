//! End-to-end pipeline tests: fetch → parse → segment → aggregate → summary.
//!
//! The fetcher is faked, so no network access is needed.

use event_insights::data::{GamesPlayedBucket, LoaderOptions};
use event_insights::stats::{
    distribution, mean_by_group, segment, DensityEstimate, EventWindow, NumericField,
};
use event_insights::{DatasetCache, EventReport, Fetcher, Loader, LoaderError};
use std::cell::Cell;
use std::sync::Arc;

const EVENTS_CSV: &str = "\
Date,platform,region,games_played,skill_last,items_crafted,dollars_spent
2017-01-20,PC,NA,1,1320.0,0,0.0
2017-01-24,PC,NA,3,1410.5,2,9.99
2017-01-30,Xbox,NA,8,1502.0,4,19.99
2017-02-05,PC,EU,15,1655.0,7,4.99
2017-02-14,PS4,EU,4,1470.0,1,0.0
2017-02-20,PC,EU,70,1890.0,22,49.99
2017-02-28,Xbox,EU,2,1380.0,0,0.0
2017-03-04,PC,NA,10,1600.0,5,14.99
2017-03-12,PS4,NA,,1510.0,3,
2017-03-21,PC,NA,6,1545.0,2,29.99
2017-03-30,PC,EU,0,1300.0,0,0.0
";

const URL: &str = "https://example.test/events.csv";

struct CountingFetcher {
    body: String,
    calls: Cell<usize>,
}

impl CountingFetcher {
    fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            calls: Cell::new(0),
        }
    }
}

impl Fetcher for CountingFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, LoaderError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.body.clone().into_bytes())
    }
}

#[test]
fn test_full_pipeline_from_csv_to_summary() {
    let loader = Loader::new(CountingFetcher::new(EVENTS_CSV), Arc::new(DatasetCache::new()));
    let dataset = loader.load(URL).expect("events csv should load");
    assert_eq!(dataset.len(), 11);

    let counts = dataset.bucket_counts();
    assert_eq!(counts[&GamesPlayedBucket::VeryLow], 3);
    assert_eq!(counts[&GamesPlayedBucket::Low], 1);
    assert_eq!(counts[&GamesPlayedBucket::Medium], 2);
    assert_eq!(counts[&GamesPlayedBucket::High], 2);
    assert_eq!(counts[&GamesPlayedBucket::Unknown], 3);

    let event_1 = segment(dataset.records(), &EventWindow::event_1());
    let event_2 = segment(dataset.records(), &EventWindow::event_2());
    assert_eq!(event_1.len(), 4);
    assert_eq!(event_2.len(), 4);

    // Boundary days are included on both ends.
    assert_eq!(event_1.records()[0].dollars_spent, Some(9.99));
    assert_eq!(event_2.records()[3].games_played, Some(6));

    let spend = distribution(&event_2, NumericField::DollarsSpent);
    assert_eq!(spend.count(), 3);
    assert!(spend.curve().is_some());

    let report = EventReport::build(&dataset, &EventWindow::event_1(), &EventWindow::event_2());
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["segments"][0]["rows"], 4);
    assert_eq!(json["segments"][1]["rows"], 4);
    assert_eq!(json["comparisons"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cached_dataset_is_shared() {
    let cache = Arc::new(DatasetCache::new());
    let loader = Loader::new(CountingFetcher::new(EVENTS_CSV), cache.clone());

    let a = loader.load(URL).unwrap();
    let b = loader.load(URL).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loader.fetcher().calls.get(), 1);
    assert_eq!(cache.get(URL).map(|d| d.len()), Some(11));
}

#[test]
fn test_malformed_timestamp_aborts_load() {
    let broken = EVENTS_CSV.replace("2017-03-04", "03/04/17 noon");
    let cache = Arc::new(DatasetCache::new());
    let loader = Loader::new(CountingFetcher::new(&broken), cache.clone());

    let err = loader.load(URL).unwrap_err();
    assert!(matches!(err, LoaderError::TypeCoercion { row: 8, .. }), "got {:?}", err);
    assert!(cache.get(URL).is_none());
}

#[test]
fn test_window_with_no_rows_is_safe() {
    let loader = Loader::new(CountingFetcher::new(EVENTS_CSV), Arc::new(DatasetCache::new()));
    let dataset = loader.load(URL).unwrap();

    let quiet = EventWindow::new(
        "Quiet",
        chrono::NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        chrono::NaiveDate::from_ymd_opt(2018, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    );
    let seg = segment(dataset.records(), &quiet);
    assert!(seg.is_empty());

    for field in NumericField::ALL {
        assert_eq!(distribution(&seg, field), DensityEstimate::Empty);
    }
    assert!(mean_by_group(seg.records()).is_empty());

    let report = EventReport::build(&dataset, &quiet, &EventWindow::event_2());
    assert_eq!(report.segments[0].rows, 0);
    assert!(report.to_json().is_ok());
}

#[test]
fn test_custom_timestamp_column() {
    let renamed = EVENTS_CSV.replacen("Date", "event_date", 1);
    let loader = Loader::with_options(
        CountingFetcher::new(&renamed),
        Arc::new(DatasetCache::new()),
        LoaderOptions {
            timestamp_column: "event_date".to_string(),
        },
    );
    assert_eq!(loader.load(URL).unwrap().len(), 11);

    let default_loader =
        Loader::new(CountingFetcher::new(&renamed), Arc::new(DatasetCache::new()));
    assert!(matches!(
        default_loader.load(URL),
        Err(LoaderError::Parse(_))
    ));
}
