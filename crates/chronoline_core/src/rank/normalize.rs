//! Importance normalizer.
//!
//! # Responsibility
//! - Assign every event a `display_tier` from its position in the
//!   importance-sorted collection.
//! - Return the collection in chronological order.
//!
//! # Invariants
//! - Output length equals input length.
//! - Tiers are monotonically non-decreasing with raw importance.
//! - Events with equal raw importance are ordered by date, then by input
//!   order (stable sort). Re-normalizing the output never moves a tier.
//! - Missing raw importance ranks as `0`.

use crate::model::event::{DisplayTier, TimelineEvent};
use log::debug;

const TIER_COUNT: usize = DisplayTier::MAX.get() as usize;

/// Re-ranks `events` and returns them sorted ascending by date.
///
/// Tier for 0-based position `i` of `n` is `min(10, ceil((i + 1) * 10 / n))`.
pub fn normalize(mut events: Vec<TimelineEvent>) -> Vec<TimelineEvent> {
    let total = events.len();
    if total == 0 {
        return events;
    }

    events.sort_by_key(|event| (event.importance_key(), event.date));
    for (position, event) in events.iter_mut().enumerate() {
        event.display_tier = Some(tier_for_position(position, total));
    }
    events.sort_by_key(|event| event.date);

    debug!("event=normalize module=rank status=ok count={total}");
    events
}

/// Tier for the event at 0-based `position` among `total` ranked events.
///
/// Positions past the end saturate at the highest tier; `total == 0` is
/// treated as a single-event collection.
pub fn tier_for_position(position: usize, total: usize) -> DisplayTier {
    let total = total.max(1);
    let rank = position.min(total - 1) + 1;
    let tier = (rank * TIER_COUNT).div_ceil(total).clamp(1, TIER_COUNT);
    DisplayTier::new(tier as u8).unwrap_or(DisplayTier::MAX)
}
