//! Timeline event model.
//!
//! # Responsibility
//! - Define the canonical record shared by import, generation, ranking and
//!   layout.
//! - Provide lenient field coercion for noisy upstream data.
//!
//! # Invariants
//! - `id` is stable and never reassigned after ingestion.
//! - `title` is non-empty after trimming for every validated event.
//! - `display_tier`, when present, is always in `1..=10`.
//! - Missing or unparseable raw importance is `None`, never an error.
//! - A persisted tier outside `1..=10` loads as `None` (unranked).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one timeline event.
pub type EventId = Uuid;

/// Relative importance rank in `1..=10`, derived from an event's position
/// within the full current event set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DisplayTier(u8);

impl DisplayTier {
    /// Lowest tier; only visible at maximum zoom.
    pub const MIN: Self = Self(1);
    /// Highest tier; visible at every zoom level.
    pub const MAX: Self = Self(10);

    /// Returns `None` when `value` is outside `1..=10`.
    pub fn new(value: u8) -> Option<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DisplayTier {
    type Error = InvalidDisplayTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidDisplayTier(value))
    }
}

impl From<DisplayTier> for u8 {
    fn from(value: DisplayTier) -> Self {
        value.0
    }
}

impl Display for DisplayTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected display tier value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDisplayTier(pub u8);

impl Display for InvalidDisplayTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "display tier {} is outside 1..=10", self.0)
    }
}

impl Error for InvalidDisplayTier {}

/// Validation errors for event identity and required text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    NilId,
    EmptyTitle,
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "event id must not be nil"),
            Self::EmptyTitle => write!(f, "event title must not be empty"),
        }
    }
}

impl Error for EventValidationError {}

/// One historical record on a timeline.
///
/// Serialized with camelCase wire names so persisted documents and UI
/// payloads share one shape. `importance` carries the raw score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: EventId,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Already normalized by `import::image_url` before reaching ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Absolute significance as judged by the source. `None` ranks as 0.
    #[serde(
        rename = "importance",
        default,
        deserialize_with = "deserialize_lenient_importance"
    )]
    pub raw_importance: Option<u32>,
    /// Rank within the collection at the last normalization.
    #[serde(default, deserialize_with = "deserialize_lenient_tier")]
    pub display_tier: Option<DisplayTier>,
}

impl TimelineEvent {
    /// Creates an event with a generated id and no importance data.
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            title: title.into(),
            description: String::new(),
            image_url: None,
            raw_importance: None,
            display_tier: None,
        }
    }

    /// Creates an event with a caller-provided id.
    ///
    /// Used by load/sync paths where identity already exists.
    pub fn with_id(
        id: EventId,
        date: NaiveDate,
        title: impl Into<String>,
    ) -> Result<Self, EventValidationError> {
        let mut event = Self::new(date, title);
        event.id = id;
        event.validate()?;
        Ok(event)
    }

    pub fn with_importance(mut self, raw_importance: u32) -> Self {
        self.raw_importance = Some(raw_importance);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Checks identity and required text invariants.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.id.is_nil() {
            return Err(EventValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Calendar year used by the layout builder.
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Raw importance used as the ranking key.
    pub fn importance_key(&self) -> u32 {
        self.raw_importance.unwrap_or(0)
    }

    /// Tier used for zoom visibility; unranked events count as the lowest tier.
    pub fn effective_tier(&self) -> DisplayTier {
        self.display_tier.unwrap_or(DisplayTier::MIN)
    }
}

/// Parses a loosely formatted event date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `YYYY`, slash separators, a leading `-`
/// for years before the common era, and a trailing `T...` time component.
/// Missing month/day default to `1`.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    let (negative, body) = match date_part.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, date_part),
    };

    let parts: Vec<&str> = body.split(['-', '/']).collect();
    if parts.len() > 3
        || parts.iter().any(|part| {
            part.is_empty() || part.len() > 6 || !part.chars().all(|c| c.is_ascii_digit())
        })
    {
        return None;
    }

    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = match parts.get(1) {
        Some(value) => value.parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.get(2) {
        Some(value) => value.parse().ok()?,
        None => 1,
    };

    let year = if negative { -year } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses an importance cell or string value.
///
/// Floats are rounded; negative, non-finite and non-numeric input yields
/// `None`.
pub fn parse_importance_text(raw: &str) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    importance_from_f64(value)
}

/// Coerces a JSON value into a raw importance score.
pub fn importance_from_json(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_f64().and_then(importance_from_f64),
        Value::String(text) => parse_importance_text(text),
        _ => None,
    }
}

fn importance_from_f64(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let rounded = value.round();
    if rounded > f64::from(u32::MAX) {
        return None;
    }
    Some(rounded as u32)
}

fn deserialize_lenient_importance<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(importance_from_json))
}

fn deserialize_lenient_tier<'de, D>(deserializer: D) -> Result<Option<DisplayTier>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|tier| u8::try_from(tier).ok())
        .and_then(DisplayTier::new))
}
