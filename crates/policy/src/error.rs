// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use palisade_cache::CacheError;
use palisade_types::error::{CodedError, ErrorKind};
use snafu::Snafu;

/// A combining error type which is returned by the policy resolver methods
///
/// Derived using [`snafu::Snafu`]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("policy cache access failed: {source}"))]
    Cache { source: CacheError },

    #[snafu(display("malformed policy: {message}"))]
    PolicyMalformed { message: String },

    #[snafu(display("no cache service configured"))]
    NoConfig,
}

impl CodedError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Cache { .. } => ErrorKind::Unavailable,
            Error::PolicyMalformed { .. } => ErrorKind::Integrity,
            Error::NoConfig => ErrorKind::Config,
        }
    }
}

/// A default specialized Result type for policy resolution
pub type Result<T, E = Error> = std::result::Result<T, E>;
