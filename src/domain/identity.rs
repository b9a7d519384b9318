use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SIGN_IN_REQUIRED: &str = "You must be signed in to continue";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: OwnerId,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: OwnerId::new(id),
            email: None,
        }
    }
}

/// Supplies the signed-in identity, if any.
pub trait IdentityGate: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    /// The "auth required" signal: fails when nobody is signed in.
    fn require_identity(&self) -> Result<Identity> {
        self.current_identity()
            .ok_or_else(|| ServiceError::Authorization(SIGN_IN_REQUIRED.to_string()))
    }
}

/// Per-visit session state threaded explicitly through calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub remember_me: bool,
    /// Where to send the user once they have signed in.
    pub post_auth_redirect: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            ..Self::default()
        }
    }

    pub fn with_post_auth_redirect(mut self, target: impl Into<String>) -> Self {
        self.post_auth_redirect = Some(target.into());
        self
    }
}

impl IdentityGate for Session {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}
