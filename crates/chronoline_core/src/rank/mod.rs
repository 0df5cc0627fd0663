//! Relative importance ranking.
//!
//! # Responsibility
//! - Map raw, source-assigned importance scores onto the 1..=10 display
//!   tiers that drive zoom visibility.
//!
//! # Invariants
//! - Ranking is pure: no I/O, no retained state between calls.
//! - Tiers are relative to the full collection passed in, so any insertion
//!   or removal requires re-ranking every event.

pub mod normalize;
