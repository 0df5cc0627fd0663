//! CSV spreadsheet import.
//!
//! # Responsibility
//! - Match spreadsheet headers against known column aliases.
//! - Convert rows into canonical events with documented defaults.
//! - Rewrite sheet share links to CSV export links and fetch with retry.
//!
//! # Invariants
//! - Header matching is case-insensitive and ignores spaces, `_` and `-`.
//! - Absent or unparseable importance defaults to `50`; parsed values are
//!   clamped to `1..=100`.
//! - Imported events are returned ranked and in chronological order.

use crate::import::image_url::normalize_image_url;
use crate::model::event::{parse_event_date, parse_importance_text, TimelineEvent};
use crate::rank::normalize::normalize;
use crate::retry::{retry_with_backoff, RetryError, RetryPolicy, Sleeper};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Importance assigned when a row carries no usable score.
pub const DEFAULT_IMPORTANCE: u32 = 50;
pub const MIN_IMPORTANCE: u32 = 1;
pub const MAX_IMPORTANCE: u32 = 100;

const DATE_ALIASES: &[&str] = &["date", "year", "when", "eventdate"];
const TITLE_ALIASES: &[&str] = &["title", "event", "name", "headline"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "desc", "details", "summary"];
const IMAGE_ALIASES: &[&str] = &["image", "imageurl", "img", "picture", "photo"];
const IMPORTANCE_ALIASES: &[&str] = &[
    "importance",
    "absimportance",
    "absoluteimportance",
    "rawimportance",
    "score",
];

static PUBLISHED_SHEET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://docs\.google\.com/spreadsheets/d/e/([A-Za-z0-9_-]+)")
        .expect("valid published sheet regex")
});
static SHARED_SHEET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://docs\.google\.com/spreadsheets/d/([A-Za-z0-9_-]+)")
        .expect("valid shared sheet regex")
});
static SHEET_GID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#&?]gid=(\d+)").expect("valid gid regex"));

/// Import-level failures. Row-level problems are reported in
/// `ImportReport::skipped` instead.
#[derive(Debug)]
pub enum ImportError {
    /// No header row was found.
    Empty,
    /// A required column has no matching header.
    MissingColumn(&'static str),
    /// The text is not parseable as CSV.
    Csv(csv::Error),
    /// The URL is not a recognized spreadsheet link.
    UnsupportedUrl(String),
    /// Fetching the export failed after all retries.
    Fetch(RetryError<FetchError>),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "spreadsheet is empty"),
            Self::MissingColumn(column) => write!(f, "spreadsheet has no `{column}` column"),
            Self::Csv(err) => write!(f, "invalid csv: {err}"),
            Self::UnsupportedUrl(url) => write!(f, "not a spreadsheet link: {url}"),
            Self::Fetch(err) => write!(f, "spreadsheet fetch failed: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Transport failure reported by a `SheetFetcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for FetchError {}

/// Downloads spreadsheet export text. Supplied by the embedding app.
pub trait SheetFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Why a row was left out of the import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidDate(String),
    EmptyTitle,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`"),
            Self::EmptyTitle => write!(f, "empty title"),
        }
    }
}

/// One skipped row; `row` is 1-based and counts the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// Successful import result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Ranked events in chronological order.
    pub events: Vec<TimelineEvent>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    title: usize,
    description: Option<usize>,
    image: Option<usize>,
    importance: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, ImportError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| {
            normalized
                .iter()
                .position(|header| aliases.contains(&header.as_str()))
        };

        Ok(Self {
            date: find(DATE_ALIASES).ok_or(ImportError::MissingColumn("date"))?,
            title: find(TITLE_ALIASES).ok_or(ImportError::MissingColumn("title"))?,
            description: find(DESCRIPTION_ALIASES),
            image: find(IMAGE_ALIASES),
            importance: find(IMPORTANCE_ALIASES),
        })
    }
}

/// Parses exported CSV text into ranked events.
pub fn parse_events_csv(text: &str) -> Result<ImportReport, ImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(ImportError::Empty);
    }
    let columns = ColumnMap::from_headers(&headers)?;

    let mut events = Vec::new();
    let mut skipped = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 2;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        match event_from_record(&record, &columns) {
            Ok(event) => events.push(event),
            Err(reason) => {
                warn!(
                    "event=import_row_skipped module=import status=skip row={} reason={}",
                    row, reason
                );
                skipped.push(SkippedRow { row, reason });
            }
        }
    }

    info!(
        "event=import_csv module=import status=ok imported={} skipped={}",
        events.len(),
        skipped.len()
    );

    Ok(ImportReport {
        events: normalize(events),
        skipped,
    })
}

/// Rewrites a spreadsheet share/edit/publish link into its CSV export URL.
///
/// Links that already request CSV output are returned unchanged.
pub fn sheet_csv_export_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.contains("output=csv") || trimmed.contains("format=csv") {
        return Some(trimmed.to_string());
    }

    let gid = SHEET_GID_RE.captures(trimmed).map(|caps| caps[1].to_string());

    if let Some(caps) = PUBLISHED_SHEET_RE.captures(trimmed) {
        let mut export = format!(
            "https://docs.google.com/spreadsheets/d/e/{}/pub?output=csv",
            &caps[1]
        );
        if let Some(gid) = gid {
            export.push_str(&format!("&gid={gid}"));
        }
        return Some(export);
    }

    let caps = SHARED_SHEET_RE.captures(trimmed)?;
    let mut export = format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
        &caps[1]
    );
    if let Some(gid) = gid {
        export.push_str(&format!("&gid={gid}"));
    }
    Some(export)
}

/// Rewrites `url`, fetches the export with retry and parses it.
pub fn fetch_sheet_events(
    fetcher: &dyn SheetFetcher,
    url: &str,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<ImportReport, ImportError> {
    let export_url =
        sheet_csv_export_url(url).ok_or_else(|| ImportError::UnsupportedUrl(url.to_string()))?;
    info!("event=import_fetch module=import status=start");
    let text = retry_with_backoff(policy, sleeper, |_| fetcher.fetch_text(&export_url))
        .map_err(ImportError::Fetch)?;
    parse_events_csv(&text)
}

fn event_from_record(
    record: &StringRecord,
    columns: &ColumnMap,
) -> Result<TimelineEvent, SkipReason> {
    let cell = |index: Option<usize>| index.and_then(|i| record.get(i)).unwrap_or("");

    let raw_date = cell(Some(columns.date));
    let date = parse_event_date(raw_date)
        .ok_or_else(|| SkipReason::InvalidDate(raw_date.to_string()))?;

    let title = cell(Some(columns.title));
    if title.is_empty() {
        return Err(SkipReason::EmptyTitle);
    }

    let importance = parse_importance_text(cell(columns.importance))
        .map(|value| value.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE))
        .unwrap_or(DEFAULT_IMPORTANCE);

    let mut event = TimelineEvent::new(date, title)
        .with_description(cell(columns.description))
        .with_importance(importance);
    event.image_url = normalize_image_url(cell(columns.image));
    Ok(event)
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
