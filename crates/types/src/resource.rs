// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The resource hierarchy.
//!
//! Resources form a finite, cycle-free chain from a root down to the leaves
//! that directly back data. The chain is finite by construction: every
//! directory owns its parent, so a cycle cannot be expressed.

use std::collections::BTreeMap;

use derive_more::{AsRef, Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of a resource within the hierarchy
///
/// Globally unique among leaf resources.
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
pub struct ResourceId(String);

impl ResourceId {
    /// Access the raw identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// The top of a resource chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResource {
    id: ResourceId,
}

impl RootResource {
    /// Create a root resource
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self { id: id.into() }
    }

    /// The root's identifier
    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

/// An intermediate resource with a parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryResource {
    id: ResourceId,
    parent: Box<ParentResource>,
}

impl DirectoryResource {
    /// Create a directory resource below the given parent
    pub fn new(id: impl Into<ResourceId>, parent: ParentResource) -> Self {
        Self {
            id: id.into(),
            parent: Box::new(parent),
        }
    }

    /// The directory's identifier
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// The directory's parent
    pub fn parent(&self) -> &ParentResource {
        &self.parent
    }
}

/// A non-leaf resource, either the root or a directory below it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentResource {
    /// The top of the chain
    Root(RootResource),
    /// An intermediate resource
    Directory(DirectoryResource),
}

impl ParentResource {
    /// The resource's identifier
    pub fn id(&self) -> &ResourceId {
        match self {
            ParentResource::Root(root) => root.id(),
            ParentResource::Directory(directory) => directory.id(),
        }
    }

    /// The next resource up the chain, if any
    pub fn parent(&self) -> Option<&ParentResource> {
        match self {
            ParentResource::Root(_) => None,
            ParentResource::Directory(directory) => Some(directory.parent()),
        }
    }
}

impl From<RootResource> for ParentResource {
    fn from(root: RootResource) -> Self {
        ParentResource::Root(root)
    }
}

impl From<DirectoryResource> for ParentResource {
    fn from(directory: DirectoryResource) -> Self {
        ParentResource::Directory(directory)
    }
}

/// A resource that directly backs data (a file, a table partition)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafResource {
    id: ResourceId,
    resource_type: String,
    serialised_format: String,
    parent: ParentResource,
}

impl LeafResource {
    /// Create a leaf resource below the given parent
    pub fn new(
        id: impl Into<ResourceId>,
        resource_type: impl Into<String>,
        serialised_format: impl Into<String>,
        parent: impl Into<ParentResource>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            serialised_format: serialised_format.into(),
            parent: parent.into(),
        }
    }

    /// The leaf's identifier
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// The declared data type of the leaf's records
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The serialised format the leaf's records are stored in
    pub fn serialised_format(&self) -> &str {
        &self.serialised_format
    }

    /// The leaf's parent
    pub fn parent(&self) -> &ParentResource {
        &self.parent
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: Some(&self.parent),
        }
    }
}

/// Iterator over a leaf's ancestors, nearest first
#[derive(Debug)]
pub struct Ancestors<'a> {
    next: Option<&'a ParentResource>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ParentResource;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

/// Any resource in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// The top of a chain
    Root(RootResource),
    /// An intermediate resource
    Directory(DirectoryResource),
    /// A resource that directly backs data
    Leaf(LeafResource),
}

impl Resource {
    /// The resource's identifier
    pub fn id(&self) -> &ResourceId {
        match self {
            Resource::Root(root) => root.id(),
            Resource::Directory(directory) => directory.id(),
            Resource::Leaf(leaf) => leaf.id(),
        }
    }
}

impl From<LeafResource> for Resource {
    fn from(leaf: LeafResource) -> Self {
        Resource::Leaf(leaf)
    }
}

/// Descriptor sufficient for a client to open a record stream against the
/// data node holding one leaf resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetail {
    url: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl ConnectionDetail {
    /// Create a connection descriptor for the given data node url
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Attach an opaque property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.properties.insert(key.into(), value.into());
        self
    }

    /// The data node url
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The attached properties
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn leaf() -> LeafResource {
        let root = RootResource::new("/");
        let dir = DirectoryResource::new("/data", root.into());
        LeafResource::new("/data/employees", "employee", "avro", dir)
    }

    #[test]
    fn ancestors_walk_nearest_first() {
        let ids = leaf()
            .ancestors()
            .map(|ancestor| ancestor.id().as_str().to_owned())
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["/data".to_owned(), "/".to_owned()]);
    }

    #[test]
    fn serde_round_trip() {
        let leaf = leaf();
        let json = serde_json::to_string(&leaf).unwrap();
        let back: LeafResource = serde_json::from_str(&json).unwrap();

        assert_eq!(leaf, back);
    }
}
