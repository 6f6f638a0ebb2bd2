// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Request tokens.

use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token minted per registered data request
///
/// Data-node reads present this token to retrieve the cached policy map for
/// the request it was minted for. 128 bits of randomness make collisions
/// practically impossible.
#[derive(
    AsRef,
    Display,
    From,
    FromStr,
    Into,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct RequestToken(Uuid);

impl RequestToken {
    /// Mint a fresh random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a token from a number, e.g. for testing purposes
    pub const fn from_u128(token: u128) -> Self {
        Self(Uuid::from_u128(token))
    }
}
