// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use palisade_cache::CacheError;
use palisade_types::error::{CodedError, ErrorKind};
use snafu::Snafu;

/// A combining error type which is returned by the coordinator
///
/// Derived using [`snafu::Snafu`]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid request: {message}"))]
    InvalidRequest { message: String },

    #[snafu(display("user lookup failed: {source}"))]
    User { source: palisade_directory::Error },

    #[snafu(display("resource expansion failed: {source}"))]
    Resource { source: palisade_resource::Error },

    #[snafu(display("policy resolution failed: {source}"))]
    Policy { source: palisade_policy::Error },

    #[snafu(display("failed to cache the policy map: {source}"))]
    Cache { source: CacheError },

    #[snafu(display("{operation} call exceeded its deadline"))]
    Timeout { operation: &'static str },
}

impl CodedError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest { .. } => ErrorKind::InvalidArgument,
            Error::User { source } => source.kind(),
            Error::Resource { source } => source.kind(),
            Error::Policy { source } => source.kind(),
            Error::Cache { .. } => ErrorKind::Unavailable,
            Error::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

/// A default specialized Result type for the coordinator
pub type Result<T, E = Error> = std::result::Result<T, E>;
