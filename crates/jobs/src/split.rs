// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Input splits.
//!
//! One planned registration fans out into splits, each carrying a non-empty
//! subset of the response's resource map together with the response's
//! token. The splits of one response partition its map exactly.

use std::any::Any;

use palisade_types::{
    collections::OrderedMap,
    request::DataRequestResponse,
    resource::{ConnectionDetail, LeafResource},
    token::RequestToken,
};
use serde::{Deserialize, Serialize};

/// A unit of parallel work as seen by the batch executor
///
/// Executors treat splits as opaque; readers downcast to the concrete type
/// they understand.
pub trait InputSplit: Any + Send + Sync {
    /// Upcast for downcasting by readers
    fn as_any(&self) -> &dyn Any;

    /// Number of leaf resources covered by this split
    fn resource_count(&self) -> usize;
}

/// The split consumed by Palisade record readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalisadeSplit {
    response: DataRequestResponse,
}

impl PalisadeSplit {
    pub fn new(response: DataRequestResponse) -> Self {
        Self { response }
    }

    /// The token of the registration this split was planned from
    pub fn token(&self) -> RequestToken {
        self.response.token
    }

    /// The subset of the parent response's resource map
    pub fn resources(&self) -> &OrderedMap<LeafResource, ConnectionDetail> {
        &self.response.resources
    }

    pub fn into_response(self) -> DataRequestResponse {
        self.response
    }
}

impl InputSplit for PalisadeSplit {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn resource_count(&self) -> usize {
        self.response.resources.len()
    }
}

/// Partition one response into at most `min(|map|, hint)` splits
///
/// The resource at insertion index `i` lands in split `i % k` where `k` is
/// the chosen split count; a hint of 0 yields one split per resource. An
/// empty response produces no splits, so every split is non-empty.
pub(crate) fn partition(response: DataRequestResponse, hint: u32) -> Vec<PalisadeSplit> {
    let DataRequestResponse { token, resources } = response;

    if resources.is_empty() {
        return Vec::new();
    }

    let split_count = if hint == 0 {
        resources.len()
    } else {
        resources.len().min(hint as usize)
    };

    let mut buckets: Vec<OrderedMap<LeafResource, ConnectionDetail>> =
        std::iter::repeat_with(OrderedMap::new)
            .take(split_count)
            .collect();

    for (slot, (leaf, connection)) in (0..split_count).cycle().zip(resources) {
        let _ = buckets[slot].insert(leaf, connection);
    }

    buckets
        .into_iter()
        .map(|resources| PalisadeSplit::new(DataRequestResponse::new(token, resources)))
        .collect()
}
