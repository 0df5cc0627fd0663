//! Persisted timeline document model.
//!
//! # Responsibility
//! - Define the unit saved to and loaded from a `TimelineStore`.
//! - Generate slug-plus-timestamp timeline identifiers.
//!
//! # Invariants
//! - `TimelineId` values are non-empty and contain only `[a-z0-9-]`.
//! - Persisted `display_tier` values are trusted as-is on load.

use crate::model::event::TimelineEvent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const MAX_SLUG_CHARS: usize = 48;
const FALLBACK_SLUG: &str = "timeline";

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));
static TIMELINE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid timeline id regex"));

/// Identifier for one saved timeline, `"<slug>-<unix-millis>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineId(String);

impl TimelineId {
    /// Builds an id from a human title and a creation timestamp.
    pub fn generate(title: &str, created_at_ms: i64) -> Self {
        Self(format!("{}-{}", slugify(title), created_at_ms.max(0)))
    }

    /// Wraps an existing id, rejecting values outside the id alphabet.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if TIMELINE_ID_RE.is_match(trimmed) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TimelineId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercases `title`, collapses non-alphanumeric runs into `-` and caps
/// the result length. Returns `"timeline"` when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let collapsed = NON_SLUG_RE.replace_all(&lowered, "-");
    let capped: String = collapsed.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    let slug = capped.trim_end_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Full persisted timeline: metadata plus the ranked event collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument {
    pub id: TimelineId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub updated_at_ms: i64,
}

impl TimelineDocument {
    /// Creates an empty document with an id derived from `title`.
    pub fn new(title: impl Into<String>, created_at_ms: i64) -> Self {
        let title = title.into();
        Self {
            id: TimelineId::generate(&title, created_at_ms),
            title,
            description: String::new(),
            events: Vec::new(),
            updated_at_ms: created_at_ms,
        }
    }

    pub fn summary(&self) -> TimelineSummary {
        TimelineSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            event_count: self.events.len(),
            updated_at_ms: self.updated_at_ms,
        }
    }
}

/// Listing projection for saved timelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub id: TimelineId,
    pub title: String,
    pub event_count: usize,
    pub updated_at_ms: i64,
}
