// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Resource providers.
//!
//! A resource provider expands a logical resource name into the concrete
//! leaf resources backing it, each paired with the connection descriptor of
//! the data node holding it. Concrete enumeration (filesystem walking,
//! catalog queries) is behind the [`ResourceProvider`] trait; this crate
//! ships an in-memory provider for static deployments and tests.

use async_trait::async_trait;
use palisade_types::{
    collections::OrderedMap,
    error::{CodedError, ErrorKind},
    resource::{ConnectionDetail, LeafResource, Resource, ResourceId},
};
use parking_lot::RwLock;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("no resources found for id {id}"))]
    ResourceNotFound { id: ResourceId },

    #[snafu(display("resource provider unavailable: {message}"))]
    ProviderUnavailable { message: String },

    #[snafu(display("this provider does not support adding resources"))]
    AddNotSupported,
}

impl CodedError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::ResourceNotFound { .. } => ErrorKind::NotFound,
            Error::ProviderUnavailable { .. } => ErrorKind::Unavailable,
            Error::AddNotSupported => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The resource map returned by provider queries
pub type ResourceMap = OrderedMap<LeafResource, ConnectionDetail>;

/// Expansion of logical resource names into concrete leaves
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Expand a logical id into all leaves backing it
    ///
    /// The id matches a leaf directly or names a point in the hierarchy
    /// whose descendants are all returned. Fails with
    /// [`Error::ResourceNotFound`] when nothing matches.
    async fn get_resources_by_id(&self, id: &ResourceId) -> Result<ResourceMap>;

    /// Expand a resource value, equivalent to expanding its id
    async fn get_resources_by_resource(&self, resource: &Resource) -> Result<ResourceMap> {
        self.get_resources_by_id(resource.id()).await
    }

    /// All leaves whose declared data type matches
    ///
    /// An empty map is a valid answer; type queries are searches.
    async fn get_resources_by_type(&self, resource_type: &str) -> Result<ResourceMap>;

    /// All leaves stored in the given serialised format
    async fn get_resources_by_serialised_format(&self, format: &str) -> Result<ResourceMap>;

    /// Register a leaf with its connection descriptor
    ///
    /// Optional; providers backed by an external catalog reject this with
    /// [`Error::AddNotSupported`].
    async fn add_resource(
        &self,
        _resource: LeafResource,
        _connection: ConnectionDetail,
    ) -> Result<()> {
        AddNotSupportedSnafu.fail()
    }
}

/// In-memory provider over a fixed set of registered leaves
#[derive(Default)]
pub struct StaticResourceProvider {
    resources: RwLock<ResourceMap>,
}

impl StaticResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider pre-populated with the given leaves
    pub fn with_resources(
        resources: impl IntoIterator<Item = (LeafResource, ConnectionDetail)>,
    ) -> Self {
        Self {
            resources: RwLock::new(resources.into_iter().collect()),
        }
    }

    fn collect(&self, matches: impl Fn(&LeafResource) -> bool) -> ResourceMap {
        self.resources
            .read()
            .iter()
            .filter(|(leaf, _)| matches(leaf))
            .map(|(leaf, connection)| (leaf.clone(), connection.clone()))
            .collect()
    }
}

#[async_trait]
impl ResourceProvider for StaticResourceProvider {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_resources_by_id(&self, id: &ResourceId) -> Result<ResourceMap> {
        let descendant_prefix = format!("{}/", id.as_str());
        let matched = self.collect(|leaf| {
            leaf.id() == id || leaf.id().as_str().starts_with(&descendant_prefix)
        });

        ensure!(
            !matched.is_empty(),
            ResourceNotFoundSnafu { id: id.clone() }
        );

        Ok(matched)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_resources_by_type(&self, resource_type: &str) -> Result<ResourceMap> {
        Ok(self.collect(|leaf| leaf.resource_type() == resource_type))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_resources_by_serialised_format(&self, format: &str) -> Result<ResourceMap> {
        Ok(self.collect(|leaf| leaf.serialised_format() == format))
    }

    async fn add_resource(
        &self,
        resource: LeafResource,
        connection: ConnectionDetail,
    ) -> Result<()> {
        let _ = self.resources.write().insert(resource, connection);
        Ok(())
    }
}
