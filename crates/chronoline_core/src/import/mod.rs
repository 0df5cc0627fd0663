//! Spreadsheet ingestion collaborator.
//!
//! # Responsibility
//! - Turn exported spreadsheet text into canonical, ranked events.
//! - Rewrite sheet share links and media-host image URLs into fetchable form.
//!
//! # Invariants
//! - Every event leaving this module has a fresh id, a valid date, a
//!   non-empty title and a raw importance in `1..=100`.
//! - Bad rows are skipped and reported, never fatal to the whole import.

pub mod image_url;
pub mod sheet;
