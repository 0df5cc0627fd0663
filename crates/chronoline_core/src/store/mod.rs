//! Timeline persistence contracts and in-process implementations.
//!
//! # Responsibility
//! - Define the document-store contract used to save and load timelines.
//! - Scope every document by tenant and user identity.
//! - Deliver full-snapshot updates through cancellable subscriptions.
//!
//! # Invariants
//! - Loading never re-ranks events; persisted tiers are trusted as-is.
//! - A cancelled subscription never receives another snapshot.
//! - Stores are explicitly constructed and passed in; there is no global
//!   client instance.

use crate::model::timeline::{TimelineDocument, TimelineId, TimelineSummary};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client;
pub mod identity;
pub mod memory;
pub mod subscription;

pub use client::StoreClient;
pub use identity::{AnonymousIdentity, IdentityProvider, UserId};
pub use memory::MemoryTimelineStore;
pub use subscription::{Subscription, SubscriptionCanceller};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence-layer error.
#[derive(Debug)]
pub enum StoreError {
    NotFound(TimelineId),
    Serialization(serde_json::Error),
    /// Stored bytes do not decode into a timeline document.
    InvalidDocument { path: String, message: String },
    /// Identity provider refused to issue a user id.
    Auth(String),
    /// A lock guarding store state was poisoned by a panicking writer.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "timeline not found: {id}"),
            Self::Serialization(err) => write!(f, "timeline serialization failed: {err}"),
            Self::InvalidDocument { path, message } => {
                write!(f, "invalid timeline document at `{path}`: {message}")
            }
            Self::Auth(message) => write!(f, "authentication failed: {message}"),
            Self::Poisoned => write!(f, "timeline store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Tenant + user namespace that owns a set of timelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreScope {
    pub tenant_id: String,
    pub user_id: UserId,
}

impl StoreScope {
    pub fn new(tenant_id: impl Into<String>, user_id: UserId) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id,
        }
    }

    /// Collection path holding this scope's timelines, with trailing `/`.
    pub fn collection_path(&self) -> String {
        format!(
            "artifacts/{}/users/{}/timelines/",
            self.tenant_id, self.user_id
        )
    }

    /// Full document path for one timeline.
    pub fn document_path(&self, id: &TimelineId) -> String {
        format!("{}{}", self.collection_path(), id)
    }
}

/// Document-store contract for timeline persistence.
pub trait TimelineStore: Send + Sync {
    /// Creates or fully replaces a document and notifies its subscribers.
    fn save(&self, scope: &StoreScope, document: &TimelineDocument) -> StoreResult<()>;

    fn load(&self, scope: &StoreScope, id: &TimelineId) -> StoreResult<Option<TimelineDocument>>;

    /// Lists summaries sorted by `updated_at_ms DESC, id ASC`.
    fn list(&self, scope: &StoreScope) -> StoreResult<Vec<TimelineSummary>>;

    /// Removes a document; `NotFound` when it does not exist.
    fn delete(&self, scope: &StoreScope, id: &TimelineId) -> StoreResult<()>;

    /// Opens a snapshot feed. The current document, when present, is
    /// delivered immediately.
    fn subscribe(&self, scope: &StoreScope, id: &TimelineId) -> StoreResult<Subscription>;
}
