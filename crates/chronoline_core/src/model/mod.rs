//! Canonical domain model for timeline data.
//!
//! # Responsibility
//! - Define the one event shape every ingestion path must produce.
//! - Define the persisted timeline document and its identifier.
//!
//! # Invariants
//! - Every event is identified by a stable `EventId` assigned at ingestion.
//! - Event dates are always valid calendar dates (type-enforced).
//! - `display_tier` is derived data and is overwritten by every ranking pass.

pub mod event;
pub mod timeline;
