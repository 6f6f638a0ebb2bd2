// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Dispatch from persisted rule entries to rule implementations.
//!
//! Policy bindings are cached as data; the code evaluating them lives in a
//! registry of factories keyed by evaluator id. A factory receives the
//! entry's configuration and produces a ready-to-apply rule.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use palisade_types::rules::Rule;

use crate::error::{Error, Result};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Factory producing a configured rule from a persisted entry's config
pub type RuleFactory<T> =
    Arc<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Rule<T>>, BoxError> + Send + Sync>;

/// Registry of rule evaluators over `T`
pub struct RuleRegistry<T> {
    factories: HashMap<String, RuleFactory<T>>,
}

impl<T> Default for RuleRegistry<T> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<T> fmt::Debug for RuleRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("evaluators", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> RuleRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `evaluator`, replacing any previous one
    pub fn register<F>(&mut self, evaluator: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Arc<dyn Rule<T>>, BoxError> + Send + Sync + 'static,
    {
        let _ = self.factories.insert(evaluator.into(), Arc::new(factory));
    }

    /// Chaining variant of [`register`](Self::register)
    pub fn with<F>(mut self, evaluator: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Result<Arc<dyn Rule<T>>, BoxError> + Send + Sync + 'static,
    {
        self.register(evaluator, factory);
        self
    }

    /// Build the rule for a persisted entry
    ///
    /// Fails with [`Error::PolicyMalformed`] for unknown evaluators or
    /// configurations the factory rejects.
    pub fn build(&self, evaluator: &str, config: &serde_json::Value) -> Result<Arc<dyn Rule<T>>> {
        let factory = self
            .factories
            .get(evaluator)
            .ok_or_else(|| Error::PolicyMalformed {
                message: format!("unknown rule evaluator {evaluator}"),
            })?;

        factory(config).map_err(|source| Error::PolicyMalformed {
            message: format!("evaluator {evaluator} rejected its configuration: {source}"),
        })
    }
}
