// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Common data types for Palisade.
//!
//! This crate contains the data model shared by every Palisade service:
//! users, request contexts, the resource hierarchy, rule chains, policies,
//! registration requests/responses and the wire error taxonomy.

#![deny(
    bad_style,
    missing_debug_implementations,
    missing_docs,
    overflowing_literals,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

pub mod collections;
pub mod context;
pub mod error;
pub mod policy;
pub mod record;
pub mod request;
pub mod resource;
pub mod rules;
pub mod token;
pub mod users;
