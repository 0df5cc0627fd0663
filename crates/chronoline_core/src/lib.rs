//! Core domain logic for Chronoline.
//! This crate is the single source of truth for ranking, zoom and layout
//! invariants; I/O adapters plug in through the traits it defines.

pub mod config;
pub mod generate;
pub mod import;
pub mod layout;
pub mod logging;
pub mod model;
pub mod rank;
pub mod retry;
pub mod session;
pub mod store;

pub use config::{AppConfig, ConfigError, ConfigOverrides, ConfigSources, DatabaseCredentials};
pub use generate::research::{
    build_research_prompt, parse_generated_events, research_events, GenerationError,
    ResearchClient, ServiceError,
};
pub use import::image_url::normalize_image_url;
pub use import::sheet::{
    fetch_sheet_events, parse_events_csv, sheet_csv_export_url, FetchError, ImportError,
    ImportReport, SheetFetcher, SkipReason, SkippedRow,
};
pub use layout::{build_layout, filter_by_zoom, layout_for_zoom, marker_step, RenderItem, ZoomLevel};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError, LoggingStatus};
pub use model::event::{
    parse_event_date, DisplayTier, EventId, EventValidationError, InvalidDisplayTier,
    TimelineEvent,
};
pub use model::timeline::{TimelineDocument, TimelineId, TimelineSummary};
pub use rank::normalize::{normalize, tier_for_position};
pub use retry::{retry_with_backoff, RetryError, RetryPolicy, Sleeper, ThreadSleeper};
pub use session::{ApplyOutcome, RequestTicket, RequestTracker, TimelineSession};
pub use store::{
    AnonymousIdentity, IdentityProvider, MemoryTimelineStore, StoreClient, StoreError,
    StoreResult, StoreScope, Subscription, SubscriptionCanceller, TimelineStore, UserId,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
