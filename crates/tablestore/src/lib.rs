// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! The Partitioned-Table style provider.
//!
//! This store models data as rows addressed by `(partition key, row key)`
//! inside named tables, with native multi-operation batches (one wire call
//! per batch), server-assigned concurrency tokens and timestamps, and
//! segmented queries driven by continuation tokens.
//!
//! [`TableStoreClient`] adapts the uniform [`TableClient`] contract onto a
//! [`TableStoreDriver`], the minimal wire surface an SDK client must
//! expose. [`MemoryTableStoreDriver`] is the embedded in-process backend;
//! SDK-backed drivers come in through [`TableStoreClient::with_driver`].
//!
//! [`TableClient`]: polytable_core::TableClient

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod client;
mod driver;
mod memory;

pub use client::TableStoreClient;
pub use driver::{
	CONNECTION_STRING, ContinuationToken, NativeRow, PROVIDER, RowSegment, TableStoreDriver, WriteOperation,
	WriteResult,
};
pub use memory::MemoryTableStoreDriver;
