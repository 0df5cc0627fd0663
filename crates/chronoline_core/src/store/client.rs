//! Explicitly constructed persistence client.
//!
//! # Responsibility
//! - Bind a store, a resolved config and a signed-in identity into one
//!   handle that the I/O layer passes around.
//! - Track every subscription it opens so `dispose` can release them.
//!
//! # Invariants
//! - `save` stamps `updated_at_ms` before writing.
//! - Only live subscriptions stay tracked; ended ones are pruned on the
//!   next `subscribe`.
//! - After `dispose`, no subscription opened through this client receives
//!   further snapshots.

use crate::config::AppConfig;
use crate::model::timeline::{TimelineDocument, TimelineId, TimelineSummary};
use crate::store::identity::{IdentityProvider, UserId};
use crate::store::subscription::{Subscription, SubscriptionCanceller};
use crate::store::{StoreResult, StoreScope, TimelineStore};
use chrono::Utc;
use log::info;

/// Persistence handle for one signed-in user.
pub struct StoreClient<S: TimelineStore> {
    store: S,
    scope: StoreScope,
    sandbox: bool,
    cancellers: Vec<SubscriptionCanceller>,
}

impl<S: TimelineStore> StoreClient<S> {
    /// Signs in through `identity` and returns a ready client.
    pub fn init(
        config: &AppConfig,
        store: S,
        identity: &dyn IdentityProvider,
    ) -> StoreResult<Self> {
        let user = identity.sign_in_anonymously()?;
        info!(
            "event=store_client_init module=store status=ok tenant={} sandbox={}",
            config.tenant_id, config.is_sandbox_mode
        );
        Ok(Self {
            store,
            scope: StoreScope::new(config.tenant_id.clone(), user),
            sandbox: config.is_sandbox_mode,
            cancellers: Vec::new(),
        })
    }

    pub fn user(&self) -> &UserId {
        &self.scope.user_id
    }

    pub fn scope(&self) -> &StoreScope {
        &self.scope
    }

    pub fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stamps `updated_at_ms` with the current time and writes the document.
    pub fn save(&self, document: &mut TimelineDocument) -> StoreResult<()> {
        document.updated_at_ms = Utc::now().timestamp_millis();
        self.store.save(&self.scope, document)
    }

    pub fn load(&self, id: &TimelineId) -> StoreResult<Option<TimelineDocument>> {
        self.store.load(&self.scope, id)
    }

    pub fn list(&self) -> StoreResult<Vec<TimelineSummary>> {
        self.store.list(&self.scope)
    }

    pub fn delete(&self, id: &TimelineId) -> StoreResult<()> {
        self.store.delete(&self.scope, id)
    }

    /// Opens a snapshot feed that `dispose` will also cancel.
    pub fn subscribe(&mut self, id: &TimelineId) -> StoreResult<Subscription> {
        let subscription = self.store.subscribe(&self.scope, id)?;
        self.cancellers.retain(SubscriptionCanceller::is_active);
        self.cancellers.push(subscription.canceller());
        Ok(subscription)
    }

    /// Number of subscriptions `dispose` would currently release.
    pub fn tracked_subscriptions(&self) -> usize {
        self.cancellers.len()
    }

    /// Cancels every subscription opened through this client.
    pub fn dispose(mut self) {
        let released = self.cancellers.len();
        for canceller in self.cancellers.drain(..) {
            canceller.cancel();
        }
        info!("event=store_client_dispose module=store status=ok released={released}");
    }
}
