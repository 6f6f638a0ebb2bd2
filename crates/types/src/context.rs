// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Request context carried end-to-end through a data request.

use std::collections::BTreeMap;

use derive_more::{AsRef, Display, From, Into};
use serde::{Deserialize, Serialize};

/// The human-readable reason a user claims for requesting access
///
/// Part of every [`Context`]; auditable by the data owner.
#[derive(
    AsRef, Display, From, Into, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Justification(String);

impl Justification {
    /// Access the raw justification string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Justification {
    fn from(justification: &str) -> Self {
        Self(justification.to_owned())
    }
}

/// Contextual information attached to a data request
///
/// A mandatory justification plus free-form entries that rules may inspect
/// during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Why the user claims to need access
    pub justification: Justification,
    /// Additional opaque entries available to rule evaluation
    #[serde(default)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl Context {
    /// Create a context with the given justification and no extra entries
    pub fn new(justification: impl Into<Justification>) -> Self {
        Self {
            justification: justification.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Attach an entry
    pub fn with_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let _ = self.entries.insert(key.into(), value);
        self
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }
}
