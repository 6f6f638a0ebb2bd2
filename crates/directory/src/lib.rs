// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The Palisade user directory.
//!
//! Maps user identifiers to user records (auths, roles). Records are durable
//! bindings in the cache gateway under the `users` namespace and change only
//! through administrative operations; request flows treat them as immutable.

use async_trait::async_trait;
use palisade_cache::{Cache, CacheError};
use palisade_types::{
    error::{CodedError, ErrorKind},
    users::{User, UserId},
};
use snafu::{OptionExt, ResultExt, Snafu};

/// The cache namespace holding user records
pub const NAMESPACE: &str = "users";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("no user found for id {id}"))]
    NoSuchUser { id: UserId },

    #[snafu(display("user directory cache access failed: {source}"))]
    Cache { source: CacheError },
}

impl CodedError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::NoSuchUser { .. } => ErrorKind::NotFound,
            Error::Cache { .. } => ErrorKind::Unavailable,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Lookup and administration of user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the record for `id`
    ///
    /// Fails with [`Error::NoSuchUser`] when the id is unknown.
    async fn get_user(&self, id: &UserId) -> Result<User>;

    /// Store a user record, replacing any previous one under the same id
    async fn add_user(&self, user: User) -> Result<()>;
}

/// User directory backed by the cache gateway
pub struct CachedUserDirectory {
    cache: Cache<UserId, User>,
}

impl CachedUserDirectory {
    /// Create a directory over the given cache
    ///
    /// The cache is expected to use the [`NAMESPACE`] namespace so admin
    /// tooling finds the records where it expects them.
    pub fn new(cache: Cache<UserId, User>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl UserDirectory for CachedUserDirectory {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_user(&self, id: &UserId) -> Result<User> {
        self.cache
            .get(id)
            .await
            .context(CacheSnafu)?
            .context(NoSuchUserSnafu { id: id.clone() })
    }

    #[tracing::instrument(level = "debug", skip(self, user), fields(user = %user.id))]
    async fn add_user(&self, user: User) -> Result<()> {
        self.cache
            .insert(user.id.clone(), user)
            .await
            .context(CacheSnafu)
    }
}
