use chrono::NaiveDate;
use chronoline_core::{
    fetch_sheet_events, parse_events_csv, sheet_csv_export_url, FetchError, ImportError,
    RetryPolicy, SheetFetcher, Sleeper, SkipReason, TimelineEvent,
};
use std::cell::RefCell;
use std::io::Write;
use std::time::Duration;

#[derive(Default)]
struct RecordingSleeper {
    slept: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

/// Fails a fixed number of times before returning `body`.
struct FlakyFetcher {
    failures: usize,
    body: String,
    urls: RefCell<Vec<String>>,
}

impl SheetFetcher for FlakyFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut urls = self.urls.borrow_mut();
        urls.push(url.to_string());
        if urls.len() <= self.failures {
            return Err(FetchError::new("503 service unavailable"));
        }
        Ok(self.body.clone())
    }
}

fn titles(events: &[TimelineEvent]) -> Vec<&str> {
    events.iter().map(|event| event.title.as_str()).collect()
}

#[test]
fn imports_rows_with_aliased_headers() {
    let csv = "Event Date,Headline,Details,Image_URL,Abs Importance\n\
               1969-07-20,Moon landing,Apollo 11 lands,File:Apollo 11.jpg,95\n\
               1957-10-04,Sputnik,First satellite,,80\n";

    let report = parse_events_csv(csv).unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(titles(&report.events), vec!["Sputnik", "Moon landing"]);

    let moon = &report.events[1];
    assert_eq!(moon.date, NaiveDate::from_ymd_opt(1969, 7, 20).unwrap());
    assert_eq!(moon.description, "Apollo 11 lands");
    assert_eq!(moon.raw_importance, Some(95));
    assert_eq!(
        moon.image_url.as_deref(),
        Some("https://commons.wikimedia.org/wiki/Special:FilePath/Apollo_11.jpg")
    );
    assert_eq!(report.events[0].image_url, None);
}

#[test]
fn imported_events_are_ranked() {
    let csv = "date,title,importance\n1900,a,10\n1950,b,90\n2000,c,50\n";
    let report = parse_events_csv(csv).unwrap();

    let tiers: Vec<u8> = report
        .events
        .iter()
        .map(|event| event.display_tier.unwrap().get())
        .collect();
    assert_eq!(tiers, vec![4, 10, 7]);
}

#[test]
fn importance_defaults_and_clamps() {
    let csv = "date,title,importance\n\
               1900,missing,\n\
               1901,garbage,very high\n\
               1902,too big,250\n\
               1903,zero,0\n\
               1904,fractional,42.6\n";

    let report = parse_events_csv(csv).unwrap();
    let scores: Vec<Option<u32>> = report
        .events
        .iter()
        .map(|event| event.raw_importance)
        .collect();
    assert_eq!(
        scores,
        vec![Some(50), Some(50), Some(100), Some(1), Some(43)]
    );
}

#[test]
fn missing_importance_column_defaults_every_row() {
    let report = parse_events_csv("year,name\n1815,Waterloo\n").unwrap();
    assert_eq!(report.events[0].raw_importance, Some(50));
    assert_eq!(report.events[0].year(), 1815);
}

#[test]
fn bad_rows_are_skipped_with_row_numbers() {
    let csv = "date,title\n\
               1900,good\n\
               sometime,bad date\n\
               1950,\n\
               2000,also good\n";

    let report = parse_events_csv(csv).unwrap();
    assert_eq!(titles(&report.events), vec!["good", "also good"]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].row, 3);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::InvalidDate("sometime".to_string())
    );
    assert_eq!(report.skipped[1].row, 4);
    assert_eq!(report.skipped[1].reason, SkipReason::EmptyTitle);
}

#[test]
fn short_rows_and_empty_rows_are_tolerated() {
    let csv = "date,title,description,importance\n\
               1900,short row\n\
               ,,,\n\
               1910,full row,desc,70\n";

    let report = parse_events_csv(csv).unwrap();
    assert_eq!(titles(&report.events), vec!["short row", "full row"]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.events[0].description, "");
}

#[test]
fn missing_required_column_is_an_error() {
    let err = parse_events_csv("when,description\n1900,x\n").unwrap_err();
    assert!(matches!(err, ImportError::MissingColumn("title")));

    let err = parse_events_csv("title\nx\n").unwrap_err();
    assert!(matches!(err, ImportError::MissingColumn("date")));
}

#[test]
fn empty_input_is_an_error() {
    assert!(matches!(parse_events_csv(""), Err(ImportError::Empty)));
}

#[test]
fn imports_from_a_csv_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "date,title,importance\n-0044-03-15,Ides of March,99\n").unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let report = parse_events_csv(&text).unwrap();
    assert_eq!(report.events[0].year(), -44);
    assert_eq!(report.events[0].title, "Ides of March");
}

#[test]
fn sheet_links_rewrite_to_csv_exports() {
    assert_eq!(
        sheet_csv_export_url("https://docs.google.com/spreadsheets/d/abc_123-XY/edit#gid=42")
            .as_deref(),
        Some("https://docs.google.com/spreadsheets/d/abc_123-XY/export?format=csv&gid=42")
    );
    assert_eq!(
        sheet_csv_export_url("https://docs.google.com/spreadsheets/d/abc/edit?usp=sharing")
            .as_deref(),
        Some("https://docs.google.com/spreadsheets/d/abc/export?format=csv")
    );
    assert_eq!(
        sheet_csv_export_url("https://docs.google.com/spreadsheets/d/e/2PACX-pub/pubhtml")
            .as_deref(),
        Some("https://docs.google.com/spreadsheets/d/e/2PACX-pub/pub?output=csv")
    );

    let already = "https://docs.google.com/spreadsheets/d/e/2PACX/pub?output=csv";
    assert_eq!(sheet_csv_export_url(already).as_deref(), Some(already));
    assert_eq!(sheet_csv_export_url("https://example.com/data"), None);
}

#[test]
fn fetch_retries_with_exponential_backoff_then_parses() {
    let fetcher = FlakyFetcher {
        failures: 2,
        body: "date,title\n1914,WWI begins\n".to_string(),
        urls: RefCell::new(Vec::new()),
    };
    let sleeper = RecordingSleeper::default();

    let report = fetch_sheet_events(
        &fetcher,
        "https://docs.google.com/spreadsheets/d/sheet1/edit",
        &RetryPolicy::default(),
        &sleeper,
    )
    .unwrap();

    assert_eq!(titles(&report.events), vec!["WWI begins"]);
    assert_eq!(
        *sleeper.slept.borrow(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    let urls = fetcher.urls.borrow();
    assert_eq!(urls.len(), 3);
    assert!(urls
        .iter()
        .all(|url| url == "https://docs.google.com/spreadsheets/d/sheet1/export?format=csv"));
}

#[test]
fn fetch_gives_up_after_max_attempts() {
    let fetcher = FlakyFetcher {
        failures: usize::MAX,
        body: String::new(),
        urls: RefCell::new(Vec::new()),
    };
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy {
        max_attempts: 3,
        ..RetryPolicy::default()
    };

    let err = fetch_sheet_events(
        &fetcher,
        "https://docs.google.com/spreadsheets/d/sheet1",
        &policy,
        &sleeper,
    )
    .unwrap_err();

    match err {
        ImportError::Fetch(retry) => {
            assert_eq!(retry.attempts(), 3);
            assert_eq!(retry.into_last_error().message, "503 service unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fetcher.urls.borrow().len(), 3);
    assert_eq!(sleeper.slept.borrow().len(), 2);
}

#[test]
fn fetch_rejects_unknown_links_without_calling_out() {
    let fetcher = FlakyFetcher {
        failures: 0,
        body: String::new(),
        urls: RefCell::new(Vec::new()),
    };
    let err = fetch_sheet_events(
        &fetcher,
        "ftp://files.example.com/events.csv",
        &RetryPolicy::no_retry(),
        &RecordingSleeper::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ImportError::UnsupportedUrl(_)));
    assert!(fetcher.urls.borrow().is_empty());
}
