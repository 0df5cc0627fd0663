//! Sparse timeline layout builder.
//!
//! # Responsibility
//! - Turn a date-sorted event slice into the render sequence consumed by
//!   the UI layer.
//! - Fill large year gaps with markers at a gap-dependent step.
//!
//! # Invariants
//! - Input order is preserved; the caller sorts by date.
//! - No marker is emitted before the first or after the last event.
//! - Marker years are strictly between the two surrounding event years.

use crate::layout::zoom::{filter_by_zoom, ZoomLevel};
use crate::model::event::TimelineEvent;
use log::debug;
use serde::{Deserialize, Serialize};

const CENTURY_GAP: i32 = 100;
const GENERATION_GAP: i32 = 20;
const CENTURY_STEP: i32 = 50;
const DECADE_STEP: i32 = 10;
const SHORT_STEP: i32 = 5;

/// One entry of the render sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderItem {
    Event { event: TimelineEvent },
    Marker { year: i32 },
}

impl RenderItem {
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Marker { .. })
    }

    /// Year this item occupies on the axis.
    pub fn year(&self) -> i32 {
        match self {
            Self::Event { event } => event.year(),
            Self::Marker { year } => *year,
        }
    }
}

/// Marker spacing for a positive year gap between consecutive events.
pub fn marker_step(gap: i32) -> i32 {
    if gap > CENTURY_GAP {
        CENTURY_STEP
    } else if gap > GENERATION_GAP {
        DECADE_STEP
    } else {
        SHORT_STEP
    }
}

/// Builds the render sequence for `visible`, which must be sorted by date.
pub fn build_layout(visible: &[TimelineEvent]) -> Vec<RenderItem> {
    let mut items = Vec::with_capacity(visible.len());
    let mut last_year: Option<i32> = None;

    for event in visible {
        let year = event.year();
        if let Some(previous) = last_year.filter(|previous| year > *previous) {
            let step = marker_step(year - previous);
            let mut marker = previous + step;
            while marker < year {
                items.push(RenderItem::Marker { year: marker });
                marker += step;
            }
        }
        items.push(RenderItem::Event {
            event: event.clone(),
        });
        last_year = Some(year);
    }

    debug!(
        "event=build_layout module=layout status=ok events={} items={}",
        visible.len(),
        items.len()
    );
    items
}

/// Filters by zoom, re-sorts by date and builds the render sequence.
///
/// This is the per-change call made whenever the zoom level or the event
/// set changes.
pub fn layout_for_zoom(events: &[TimelineEvent], zoom: ZoomLevel) -> Vec<RenderItem> {
    let mut visible = filter_by_zoom(events, zoom);
    visible.sort_by_key(|event| event.date);
    build_layout(&visible)
}
