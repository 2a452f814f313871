//! The verified caller identity.
//!
//! Authentication happens outside this engine; by the time an engine
//! method runs, the caller has already been resolved to a [`Principal`].
//! Authorization inside the engine is ownership/assignment based — the
//! role travels with the principal so outer layers can stack role policy
//! on top.

use serde::{Deserialize, Serialize};

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user.
    User,
    /// Administrator.
    Admin,
}

/// A verified caller, handed to every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Stable user ID.
    pub id: String,
    /// Caller role.
    pub role: Role,
}

impl Principal {
    /// Create a regular-user principal.
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
        }
    }
}
