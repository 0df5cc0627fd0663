//! Anonymous user identity.

use crate::store::{StoreError, StoreResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ANONYMOUS_PREFIX: &str = "anon-";

/// Opaque user identity issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a provider-issued id. Blank ids and ids containing `/` are
    /// rejected because they would escape the document path.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues user identities. Supplied by the embedding app.
pub trait IdentityProvider {
    fn sign_in_anonymously(&self) -> StoreResult<UserId>;
}

/// Local provider that mints a random anonymous id per sign-in, or reuses
/// a pre-issued token when one is configured.
#[derive(Debug, Clone, Default)]
pub struct AnonymousIdentity {
    preissued: Option<String>,
}

impl AnonymousIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses `token` as the user id instead of minting one.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            preissued: Some(token.into()),
        }
    }
}

impl IdentityProvider for AnonymousIdentity {
    fn sign_in_anonymously(&self) -> StoreResult<UserId> {
        let user = match &self.preissued {
            Some(token) => UserId::new(token.as_str())
                .ok_or_else(|| StoreError::Auth(format!("invalid pre-issued token `{token}`")))?,
            None => UserId(format!("{ANONYMOUS_PREFIX}{}", Uuid::new_v4().simple())),
        };
        info!("event=auth_sign_in module=store status=ok mode=anonymous");
        Ok(user)
    }
}
