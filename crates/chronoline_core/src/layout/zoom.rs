//! Zoom level and tier threshold filter.

use crate::model::event::TimelineEvent;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const MIN_ZOOM: u8 = 1;
const MAX_ZOOM: u8 = 10;

/// User-selected zoom in `1..=10`; higher shows more detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    /// Least detail: only the top tier is visible.
    pub const OVERVIEW: Self = Self(MIN_ZOOM);
    /// Most detail: every event is visible.
    pub const DETAIL: Self = Self(MAX_ZOOM);

    /// Returns `None` when `value` is outside `1..=10`.
    pub fn new(value: u8) -> Option<Self> {
        if (MIN_ZOOM..=MAX_ZOOM).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Saturates arbitrary input into the valid range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_ZOOM), i64::from(MAX_ZOOM)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Minimum display tier visible at this zoom (`11 - level`).
    pub fn threshold(self) -> u8 {
        MAX_ZOOM + 1 - self.0
    }

    pub fn zoom_in(self) -> Self {
        Self::clamped(i64::from(self.0) + 1)
    }

    pub fn zoom_out(self) -> Self {
        Self::clamped(i64::from(self.0) - 1)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::DETAIL
    }
}

impl TryFrom<u8> for ZoomLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("zoom level {value} is outside 1..=10"))
    }
}

impl From<ZoomLevel> for u8 {
    fn from(value: ZoomLevel) -> Self {
        value.0
    }
}

impl Display for ZoomLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keeps events whose tier is at least the zoom threshold, preserving order.
///
/// Unranked events count as the lowest tier.
pub fn filter_by_zoom(events: &[TimelineEvent], zoom: ZoomLevel) -> Vec<TimelineEvent> {
    let threshold = zoom.threshold();
    events
        .iter()
        .filter(|event| event.effective_tier().get() >= threshold)
        .cloned()
        .collect()
}
