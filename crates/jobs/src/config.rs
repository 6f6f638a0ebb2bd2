// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Job-scoped configuration.
//!
//! A job configuration is a plain string-to-string map the batch executor
//! hands to every worker. Palisade stores its inputs under well-known keys;
//! the typed accessors below wrap the JSON (de)serialisation.

use std::collections::BTreeMap;

use palisade_types::request::RegisterDataRequest;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{InvalidHintSnafu, MalformedConfigurationSnafu, Result};

/// Key holding the JSON array of registered data requests
pub const REGISTER_REQUESTS_KEY: &str = "palisade.input.register.requests";

/// Key holding the non-negative max parallelism hint; 0 means unlimited
pub const MAX_MAP_HINT_KEY: &str = "palisade.input.max.map.hint";

/// Key holding the JSON serialiser descriptor used by the record reader
pub const SERIALISER_KEY: &str = "palisade.input.serialiser";

/// Descriptor of the serialiser a record reader uses downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialiserDescriptor {
    /// Name of the serialised format
    pub format: String,
    /// Free-form serialiser properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// String-keyed job configuration with typed accessors for Palisade inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfiguration {
    entries: BTreeMap<String, String>,
}

impl JobConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw configuration value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.entries.insert(key.into(), value.into());
    }

    /// Read a raw configuration value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Append a data request, keeping the order of earlier appends
    pub fn add_data_request(&mut self, request: &RegisterDataRequest) -> Result<()> {
        let mut requests = self.data_requests()?;
        requests.push(request.clone());

        let serialised = serde_json::to_string(&requests).context(MalformedConfigurationSnafu {
            key: REGISTER_REQUESTS_KEY,
        })?;
        self.set(REGISTER_REQUESTS_KEY, serialised);

        Ok(())
    }

    /// The registered data requests in append order
    ///
    /// A fresh configuration yields an empty list.
    pub fn data_requests(&self) -> Result<Vec<RegisterDataRequest>> {
        match self.get(REGISTER_REQUESTS_KEY) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw).context(MalformedConfigurationSnafu {
                key: REGISTER_REQUESTS_KEY,
            }),
        }
    }

    /// Set the max parallelism hint; 0 means one split per resource
    ///
    /// The unsigned argument makes "never store a negative hint" a
    /// type-level guarantee.
    pub fn set_max_map_hint(&mut self, hint: u32) {
        self.set(MAX_MAP_HINT_KEY, hint.to_string());
    }

    /// The stored max parallelism hint
    ///
    /// An absent key means unlimited. A value planted in the raw
    /// configuration that is negative or not an integer fails with
    /// [`InvalidHint`](crate::Error::InvalidHint).
    pub fn max_map_hint(&self) -> Result<u32> {
        let Some(raw) = self.get(MAX_MAP_HINT_KEY) else {
            return Ok(0);
        };

        raw.parse::<u32>().ok().ok_or_else(|| {
            InvalidHintSnafu {
                value: raw.to_owned(),
            }
            .build()
        })
    }

    /// Store the serialiser descriptor for the record reader
    pub fn set_serialiser(&mut self, serialiser: &SerialiserDescriptor) -> Result<()> {
        let serialised = serde_json::to_string(serialiser).context(MalformedConfigurationSnafu {
            key: SERIALISER_KEY,
        })?;
        self.set(SERIALISER_KEY, serialised);

        Ok(())
    }

    /// The stored serialiser descriptor, if any
    pub fn serialiser(&self) -> Result<Option<SerialiserDescriptor>> {
        self.get(SERIALISER_KEY)
            .map(|raw| {
                serde_json::from_str(raw).context(MalformedConfigurationSnafu {
                    key: SERIALISER_KEY,
                })
            })
            .transpose()
    }
}
