//! Generative research collaborator.
//!
//! # Responsibility
//! - Build the research prompt sent to the text-generation service.
//! - Parse its free-form reply into canonical, ranked events.
//!
//! # Invariants
//! - Every generated event gets a fresh id before leaving this module.
//! - Malformed entries are dropped individually; only an empty result fails.

pub mod research;
