// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! The Kind/Key-Document style provider.
//!
//! This store groups entities by kind inside a namespace and addresses
//! them by a single key name; the uniform contract maps table → namespace,
//! partition key → kind and row key → key name. Every write, single or
//! plural, runs as an explicit transaction (begin, stage, commit), and a
//! plural batch commits atomically. The store assigns no concurrency
//! tokens and no server timestamps: the token travels as an ordinary
//! attribute and the adapter stamps the timestamp client-side before
//! transmission.
//!
//! [`DatastoreClient`] adapts the uniform [`TableClient`] contract onto a
//! [`DatastoreDriver`]. [`MemoryDatastoreDriver`] is the embedded
//! in-process backend; SDK-backed drivers come in through
//! [`DatastoreClient::with_driver`].
//!
//! [`TableClient`]: polytable_core::TableClient

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod client;
mod codec;
mod driver;
mod memory;

pub use client::DatastoreClient;
pub use driver::{
	Cursor, DatastoreDriver, DatastoreTransaction, EntityKey, EntityPage, NativeEntity, PROJECT_ID, PROVIDER,
	Property,
};
pub use memory::MemoryDatastoreDriver;
