// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! The wire surface a partitioned-table SDK client must expose.
//!
//! The adapter only ever needs four primitives: point retrieve, a single
//! write, a native batch write, and one query segment at a time. Everything
//! above that (marshaling, token defaulting, cancellation) lives in the
//! adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polytable_core::{Result, codec::AttributeMap};

/// Registry name of this provider.
pub const PROVIDER: &str = "tablestore";

/// Option key carrying the store's connection string; required at
/// construction.
pub const CONNECTION_STRING: &str = "connection_string";

/// A row as the store sees it: key slots, system slots and the generic
/// attribute bag. The token and timestamp slots are store-owned; writes
/// carry the caller's token for the concurrency check and leave the
/// timestamp slot empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeRow {
	pub partition_key: String,
	pub row_key: String,
	pub etag: Option<String>,
	pub timestamp: Option<DateTime<Utc>>,
	pub properties: AttributeMap,
}

/// One staged write against a table.
#[derive(Clone, Debug)]
pub enum WriteOperation {
	/// Create the row; fails if the key is occupied.
	Insert(NativeRow),
	/// Merge attributes into the existing row; fails if absent.
	Merge(NativeRow),
	/// Merge into the existing row or create it.
	InsertOrMerge(NativeRow),
	/// Remove the row; fails if absent. Only key and token are used.
	Delete(NativeRow),
}

impl WriteOperation {
	pub const fn row(&self) -> &NativeRow {
		match self {
			Self::Insert(row) | Self::Merge(row) | Self::InsertOrMerge(row) | Self::Delete(row) => row,
		}
	}
}

/// Store response to one applied write.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteResult {
	/// The newly assigned concurrency token; absent for deletes.
	pub etag: Option<String>,
	/// Server-side write time.
	pub timestamp: DateTime<Utc>,
}

/// Opaque position marker for segmented queries, pointing at the next row
/// to return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContinuationToken {
	pub next_partition_key: String,
	pub next_row_key: String,
}

/// One page of query results plus the marker for the next page, if any.
#[derive(Debug, Default)]
pub struct RowSegment {
	pub rows: Vec<NativeRow>,
	pub continuation: Option<ContinuationToken>,
}

/// Minimal async client surface of the partitioned-table store.
///
/// Implementations must be safe to share across concurrent operations;
/// the adapter holds one behind an `Arc` for the lifetime of the client.
#[async_trait]
pub trait TableStoreDriver: Send + Sync {
	/// Point read. `select` pushes column projection down to the store;
	/// `None` or an empty list returns every attribute.
	async fn retrieve(
		&self,
		table: &str,
		partition_key: &str,
		row_key: &str,
		select: Option<&[String]>,
	) -> Result<Option<NativeRow>>;

	/// Apply one write operation.
	async fn execute(&self, table: &str, operation: WriteOperation) -> Result<WriteResult>;

	/// Apply a multi-operation batch as one wire call, returning one
	/// result per operation in submission order.
	async fn execute_batch(&self, table: &str, operations: Vec<WriteOperation>) -> Result<Vec<WriteResult>>;

	/// Fetch one segment of the rows under a partition, in stable row-key
	/// order, resuming from `continuation` when given.
	async fn query_segment(
		&self,
		table: &str,
		partition_key: &str,
		select: Option<&[String]>,
		continuation: Option<ContinuationToken>,
	) -> Result<RowSegment>;
}
