//! Render-sequence construction for the visual timeline.
//!
//! # Responsibility
//! - Filter ranked events by the current zoom level.
//! - Interleave visible events with synthetic year markers across gaps.
//!
//! # Invariants
//! - Layout output is built fresh on every pass and never persisted.
//! - Markers only appear strictly between two visible events.

pub mod sparse;
pub mod zoom;

pub use sparse::{build_layout, layout_for_zoom, marker_step, RenderItem};
pub use zoom::{filter_by_zoom, ZoomLevel};
