// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The wire error taxonomy.
//!
//! Every service error maps to one of these kinds; the kind's snake_case
//! code string is the stable identifier in response envelopes. Transport
//! status codes are a hint only, never authoritative.

use serde::{Deserialize, Serialize};

/// The kind of a service error
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-side programming error, surfaced synchronously where possible
    InvalidArgument,
    /// A referenced user, resource or policy does not exist
    NotFound,
    /// A backing service is unreachable; the caller may retry
    Unavailable,
    /// An operation exceeded its deadline
    Timeout,
    /// Missing or inconsistent deployment configuration
    Config,
    /// Malformed or mismatched data surfaced to the user
    Integrity,
    /// The operation was cancelled cooperatively
    Cancelled,
}

impl ErrorKind {
    /// The stable wire code for this kind
    pub fn code(self) -> &'static str {
        self.into()
    }
}

/// An error that maps onto the wire taxonomy
pub trait CodedError: std::error::Error {
    /// The taxonomy kind of this error
    fn kind(&self) -> ErrorKind;

    /// The stable wire code of this error
    fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// The error shape carried in response envelopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Stable error code
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorEnvelope {
    /// Build the envelope for an error
    pub fn from_error<E: CodedError>(error: &E) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(ErrorKind::InvalidArgument.code(), "invalid_argument");
        assert_eq!(ErrorKind::NotFound.code(), "not_found");
        assert_eq!(ErrorKind::Unavailable.code(), "unavailable");
        assert_eq!(ErrorKind::Timeout.code(), "timeout");
        assert_eq!(ErrorKind::Config.code(), "config");
        assert_eq!(ErrorKind::Integrity.code(), "integrity");
        assert_eq!(ErrorKind::Cancelled.code(), "cancelled");
    }
}
