//! Timeline session state.
//!
//! # Responsibility
//! - Own the current timeline document and zoom level.
//! - Re-rank the full event set on every mutation.
//! - Discard responses from superseded import/generation requests.
//!
//! # Invariants
//! - After any mutation, every event tier reflects the current collection.
//! - Events are always held in chronological order.
//! - Only the most recently issued request ticket may replace events.

use crate::layout::sparse::{layout_for_zoom, RenderItem};
use crate::layout::zoom::ZoomLevel;
use crate::model::event::{EventId, TimelineEvent};
use crate::model::timeline::TimelineDocument;
use crate::rank::normalize::normalize;
use log::{debug, info};

/// Handle identifying one in-flight import or generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Monotonic request-generation counter.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    /// Issues a new ticket, superseding every earlier one.
    pub fn begin(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }
}

/// Result of applying a request's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { event_count: usize },
    Stale,
}

/// In-memory state behind one open timeline view.
#[derive(Debug, Clone)]
pub struct TimelineSession {
    document: TimelineDocument,
    zoom: ZoomLevel,
    requests: RequestTracker,
}

impl TimelineSession {
    /// Starts an empty session.
    pub fn new(document: TimelineDocument) -> Self {
        let mut session = Self::from_document(document);
        session.rerank();
        session
    }

    /// Resumes a persisted document, trusting its stored tiers.
    pub fn from_document(document: TimelineDocument) -> Self {
        Self {
            document,
            zoom: ZoomLevel::default(),
            requests: RequestTracker::default(),
        }
    }

    pub fn document(&self) -> &TimelineDocument {
        &self.document
    }

    pub fn into_document(self) -> TimelineDocument {
        self.document
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.document.events
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: ZoomLevel) {
        self.zoom = zoom;
    }

    pub fn zoom_in(&mut self) -> ZoomLevel {
        self.zoom = self.zoom.zoom_in();
        self.zoom
    }

    pub fn zoom_out(&mut self) -> ZoomLevel {
        self.zoom = self.zoom.zoom_out();
        self.zoom
    }

    /// Replaces the whole event set.
    pub fn replace_events(&mut self, events: Vec<TimelineEvent>) {
        self.document.events = events;
        self.rerank();
    }

    pub fn add_event(&mut self, event: TimelineEvent) {
        self.document.events.push(event);
        self.rerank();
    }

    /// Returns `false` when no event has `id`.
    pub fn remove_event(&mut self, id: EventId) -> bool {
        let before = self.document.events.len();
        self.document.events.retain(|event| event.id != id);
        if self.document.events.len() == before {
            return false;
        }
        self.rerank();
        true
    }

    /// Replaces the event with the same id. Returns `false` when absent.
    pub fn update_event(&mut self, event: TimelineEvent) -> bool {
        let Some(slot) = self
            .document
            .events
            .iter_mut()
            .find(|existing| existing.id == event.id)
        else {
            return false;
        };
        *slot = event;
        self.rerank();
        true
    }

    /// Starts a new import/generation request, superseding earlier ones.
    pub fn begin_request(&mut self) -> RequestTicket {
        let ticket = self.requests.begin();
        debug!(
            "event=request_begin module=session status=ok generation={}",
            ticket.generation()
        );
        ticket
    }

    /// Applies a response only if `ticket` is still the latest request.
    pub fn apply_response(
        &mut self,
        ticket: RequestTicket,
        events: Vec<TimelineEvent>,
    ) -> ApplyOutcome {
        if !self.requests.is_current(ticket) {
            info!(
                "event=request_apply module=session status=skip reason=stale generation={}",
                ticket.generation()
            );
            return ApplyOutcome::Stale;
        }
        self.replace_events(events);
        ApplyOutcome::Applied {
            event_count: self.document.events.len(),
        }
    }

    /// Render sequence for the current zoom level.
    pub fn render(&self) -> Vec<RenderItem> {
        layout_for_zoom(&self.document.events, self.zoom)
    }

    /// Re-renders from an incoming snapshot, keeping zoom and request state.
    pub fn apply_snapshot(&mut self, snapshot: TimelineDocument) -> Vec<RenderItem> {
        self.document = snapshot;
        self.render()
    }

    fn rerank(&mut self) {
        let events = std::mem::take(&mut self.document.events);
        self.document.events = normalize(events);
    }
}
