// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Policies binding rule chains to resources.

use serde::{Deserialize, Serialize};

use crate::{record::Record, resource::LeafResource, rules::Rules};

/// A pair of rule chains bound to a resource or data type
///
/// Resource rules decide whether a leaf is visible at all; record rules are
/// applied per record as the data node streams. Either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    resource_rules: Rules<LeafResource>,
    record_rules: Rules<Record>,
}

impl Policy {
    /// Create a policy with no rules on either side
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource-level rule chain
    pub fn with_resource_rules(mut self, rules: Rules<LeafResource>) -> Self {
        self.resource_rules = rules;
        self
    }

    /// Set the record-level rule chain
    pub fn with_record_rules(mut self, rules: Rules<Record>) -> Self {
        self.record_rules = rules;
        self
    }

    /// The resource-level rule chain
    pub fn resource_rules(&self) -> &Rules<LeafResource> {
        &self.resource_rules
    }

    /// The record-level rule chain
    pub fn record_rules(&self) -> &Rules<Record> {
        &self.record_rules
    }
}
