// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! User identity types.

use std::collections::BTreeSet;

use derive_more::{AsRef, Display, From, Into};
use serde::{Deserialize, Serialize};

/// The id of a user known to the user directory
#[derive(
    AsRef,
    Display,
    From,
    Into,
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct UserId(String);

impl UserId {
    /// Access the raw identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A user record as returned by the user directory
///
/// The auths and roles carried here are the inputs to rule evaluation; they
/// are never modified inside a request flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's identifier
    pub id: UserId,
    /// Authorisations held by the user
    #[serde(default)]
    pub auths: BTreeSet<String>,
    /// Roles held by the user
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl User {
    /// Create a user with no auths or roles
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            auths: BTreeSet::new(),
            roles: BTreeSet::new(),
        }
    }

    /// Add an authorisation
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        let _ = self.auths.insert(auth.into());
        self
    }

    /// Add a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        let _ = self.roles.insert(role.into());
        self
    }

    /// Check whether the user holds the given authorisation
    pub fn has_auth(&self, auth: &str) -> bool {
        self.auths.contains(auth)
    }
}
