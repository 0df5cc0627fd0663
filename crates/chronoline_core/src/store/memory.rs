//! In-process document store.
//!
//! Documents are held as serialized JSON keyed by document path, so the
//! save/load round trip exercises the same wire shape a remote document
//! database would receive.

use crate::model::timeline::{TimelineDocument, TimelineId, TimelineSummary};
use crate::store::subscription::{SubscriberRegistry, Subscription};
use crate::store::{StoreError, StoreResult, StoreScope, TimelineStore};
use log::info;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Mutex-guarded map of document path to JSON body.
pub struct MemoryTimelineStore {
    documents: Mutex<BTreeMap<String, String>>,
    subscribers: Arc<SubscriberRegistry>,
}

impl Default for MemoryTimelineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTimelineStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Number of live subscriptions across all documents.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.listener_count()
    }

    fn read(&self, path: &str) -> StoreResult<Option<TimelineDocument>> {
        let documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        documents
            .get(path)
            .map(|body| decode(path, body))
            .transpose()
    }
}

impl TimelineStore for MemoryTimelineStore {
    fn save(&self, scope: &StoreScope, document: &TimelineDocument) -> StoreResult<()> {
        let path = scope.document_path(&document.id);
        let body = serde_json::to_string(document)?;
        let mut documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        documents.insert(path.clone(), body);
        let delivered = self.subscribers.publish(&path, document)?;
        drop(documents);

        info!(
            "event=timeline_save module=store status=ok events={} subscribers={}",
            document.events.len(),
            delivered
        );
        Ok(())
    }

    fn load(&self, scope: &StoreScope, id: &TimelineId) -> StoreResult<Option<TimelineDocument>> {
        self.read(&scope.document_path(id))
    }

    fn list(&self, scope: &StoreScope) -> StoreResult<Vec<TimelineSummary>> {
        let prefix = scope.collection_path();
        let documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        let mut summaries = documents
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, body)| decode(path, body).map(|document| document.summary()))
            .collect::<StoreResult<Vec<_>>>()?;

        summaries.sort_by(|left, right| {
            right
                .updated_at_ms
                .cmp(&left.updated_at_ms)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(summaries)
    }

    fn delete(&self, scope: &StoreScope, id: &TimelineId) -> StoreResult<()> {
        let path = scope.document_path(id);
        let removed = self
            .documents
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(&path);
        if removed.is_none() {
            return Err(StoreError::NotFound(id.clone()));
        }

        self.subscribers.close_path(&path)?;
        info!("event=timeline_delete module=store status=ok");
        Ok(())
    }

    fn subscribe(&self, scope: &StoreScope, id: &TimelineId) -> StoreResult<Subscription> {
        let path = scope.document_path(id);
        // Hold the document lock while registering so no save slips
        // between the seed snapshot and the listener insert.
        let documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        let current = documents
            .get(&path)
            .map(|body| decode(&path, body))
            .transpose()?;
        self.subscribers.register(&path, current)
    }
}

fn decode(path: &str, body: &str) -> StoreResult<TimelineDocument> {
    serde_json::from_str(body).map_err(|err| StoreError::InvalidDocument {
        path: path.to_string(),
        message: err.to_string(),
    })
}
