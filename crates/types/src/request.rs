// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Registration request and response payloads.

use serde::{Deserialize, Serialize};

use crate::{
    collections::OrderedMap,
    context::Context,
    resource::{ConnectionDetail, LeafResource, ResourceId},
    token::RequestToken,
    users::UserId,
};

/// A client's request to read a named resource
///
/// Compared by value; appending equal requests to a job configuration is
/// idempotent with respect to input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDataRequest {
    /// The logical name of the resource to read
    pub resource_id: ResourceId,
    /// The identity the request is made under
    pub user_id: UserId,
    /// Context carried end-to-end, including the justification
    pub context: Context,
}

impl RegisterDataRequest {
    /// Create a registration request
    pub fn new(
        resource_id: impl Into<ResourceId>,
        user_id: impl Into<UserId>,
        context: Context,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            user_id: user_id.into(),
            context,
        }
    }
}

/// The coordinator's answer to a registration
///
/// The token uniquely identifies the planning outcome; each leaf resource is
/// paired with the connection descriptor a client redeems against a data
/// node. Keys are unique and keep their resource-provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequestResponse {
    /// Token under which the per-request policy map was cached
    pub token: RequestToken,
    /// The accessible leaf resources and where to stream them from
    pub resources: OrderedMap<LeafResource, ConnectionDetail>,
}

impl DataRequestResponse {
    /// Create a response
    pub fn new(
        token: RequestToken,
        resources: OrderedMap<LeafResource, ConnectionDetail>,
    ) -> Self {
        Self { token, resources }
    }
}
