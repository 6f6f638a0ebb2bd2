// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Rule chains.
//!
//! A rule chain is persisted as pure data: every entry either names a
//! registered evaluator together with its configuration, or negates a
//! previously inherited rule by name. The evaluator implementations
//! themselves live in code and are dispatched through a rule registry at
//! evaluation time, so cached policy bindings stay serialisable.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::{context::Context, users::User};

/// Sentinel message distinguishing a default rule chain from an explicitly
/// configured one
pub const NO_RULES_SET: &str = "no rules set";

/// A predicate/transform applied to one item during a read
///
/// Returning `None` drops the item entirely.
pub trait Rule<T>: Send + Sync {
    /// Apply the rule to `item` on behalf of `user` in `context`
    fn apply(&self, item: T, user: &User, context: &Context) -> Option<T>;
}

/// One entry of a persisted rule chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleEntry {
    /// Apply the evaluator registered under `evaluator`, configured with
    /// `config`
    Rule {
        /// Name of the rule; duplicate names are allowed and preserved
        name: String,
        /// Registered evaluator id
        evaluator: String,
        /// Evaluator configuration
        #[serde(default)]
        config: serde_json::Value,
    },
    /// Remove every inherited rule named `target` when this chain is merged
    Negation {
        /// Name of the rules to remove
        target: String,
    },
}

impl RuleEntry {
    /// The entry's rule name; `None` for negations
    pub fn name(&self) -> Option<&str> {
        match self {
            RuleEntry::Rule { name, .. } => Some(name),
            RuleEntry::Negation { .. } => None,
        }
    }

    /// Whether this entry is a negation
    pub fn is_negation(&self) -> bool {
        matches!(self, RuleEntry::Negation { .. })
    }
}

/// An ordered collection of named rules over `T` with a human-readable
/// message
///
/// The message carries the [`NO_RULES_SET`] sentinel until it is set
/// explicitly; the sentinel is how merging distinguishes "default" from
/// "explicitly set".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules<T> {
    message: String,
    entries: Vec<RuleEntry>,
    #[serde(skip)]
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Default for Rules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Rules<T> {
    /// Create an empty rule chain with the sentinel message
    pub fn new() -> Self {
        Self {
            message: NO_RULES_SET.to_owned(),
            entries: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Rebuild a chain from a message and entries, e.g. after a merge
    pub fn from_parts(message: impl Into<String>, entries: Vec<RuleEntry>) -> Self {
        Self {
            message: message.into(),
            entries,
            _marker: PhantomData,
        }
    }

    /// Set the human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Append a rule dispatching to the given evaluator
    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        evaluator: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        self.entries.push(RuleEntry::Rule {
            name: name.into(),
            evaluator: evaluator.into(),
            config,
        });
        self
    }

    /// Append a negation removing inherited rules named `target`
    pub fn with_negation(mut self, target: impl Into<String>) -> Self {
        self.entries.push(RuleEntry::Negation {
            target: target.into(),
        });
        self
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the message was set explicitly (is not the sentinel)
    pub fn has_explicit_message(&self) -> bool {
        self.message != NO_RULES_SET
    }

    /// The entries in order
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Consume the chain, returning its entries
    pub fn into_entries(self) -> Vec<RuleEntry> {
        self.entries
    }

    /// Whether this chain is indistinguishable from a freshly created one
    ///
    /// A default chain means "no policy explicitly set here"; an empty chain
    /// with an explicit message is a real, unconstrained policy.
    pub fn is_default(&self) -> bool {
        self.entries.is_empty() && !self.has_explicit_message()
    }
}
