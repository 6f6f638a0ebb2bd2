// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use palisade_types::error::{CodedError, ErrorKind};
use snafu::Snafu;

/// A combining error type which is returned by planning and reading
///
/// Derived using [`snafu::Snafu`]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("no palisade coordinator bound to the job"))]
    MissingCoordinator,

    #[snafu(display("no data requests registered in the job configuration"))]
    NoRequests,

    #[snafu(display("invalid max parallelism hint {value:?}"))]
    InvalidHint { value: String },

    #[snafu(display("malformed value under configuration key {key}: {source}"))]
    MalformedConfiguration {
        key: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("request registration failed: {source}"))]
    Registration {
        source: palisade_coordinator::Error,
    },

    #[snafu(display("split is not a palisade input split"))]
    SplitTypeMismatch,

    #[snafu(display("split carries no resources"))]
    EmptySplit,

    #[snafu(display("record reader was not initialized with a split"))]
    NotInitialized,

    #[snafu(whatever, display("{message}"))]
    Other {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CodedError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCoordinator => ErrorKind::Config,
            Error::NoRequests
            | Error::InvalidHint { .. }
            | Error::MalformedConfiguration { .. } => ErrorKind::InvalidArgument,
            Error::Registration { source } => source.kind(),
            Error::SplitTypeMismatch | Error::EmptySplit | Error::NotInitialized => {
                ErrorKind::Integrity
            }
            Error::Other { .. } => ErrorKind::Unavailable,
        }
    }
}

/// A default specialized Result type for planning and reading
pub type Result<T, E = Error> = std::result::Result<T, E>;
