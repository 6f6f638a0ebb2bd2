// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Opaque record representation.

use derive_more::{AsRef, From, Into};
use serde::{Deserialize, Serialize};

/// A single record as streamed from a data node
///
/// Palisade treats record contents as opaque; record-level rules receive the
/// whole value and may transform or drop it.
#[derive(AsRef, From, Into, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(serde_json::Value);

impl Record {
    /// Access the raw record value
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consume the record, returning the raw value
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}
