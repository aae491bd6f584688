// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! In-memory implementation of the partitioned-table wire surface.
//!
//! Behaves like the remote service where the adapter can observe it:
//! inserts over an occupied key fail, merges and deletes of absent rows
//! fail, a non-wildcard token that does not match the stored one fails,
//! and every applied write assigns a fresh weak token and a server-side
//! timestamp. Batches apply fully or not at all; a row may appear at most
//! once per batch.

use std::{
	collections::{BTreeMap, HashMap},
	ops::Bound,
	sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polytable_core::{ETAG_ANY, Error, Result, codec::AttributeMap};
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::driver::{ContinuationToken, NativeRow, RowSegment, TableStoreDriver, WriteOperation, WriteResult};

const DEFAULT_PAGE_SIZE: usize = 1000;

type RowKey = (String, String);

#[derive(Clone, Debug)]
struct StoredRow {
	etag: String,
	timestamp: DateTime<Utc>,
	properties: AttributeMap,
}

impl StoredRow {
	fn to_row(&self, partition_key: &str, row_key: &str, select: Option<&[String]>) -> NativeRow {
		let properties = match select {
			Some(columns) if !columns.is_empty() => self
				.properties
				.iter()
				.filter(|(name, _)| columns.iter().any(|column| column == *name))
				.map(|(name, value)| (name.clone(), value.clone()))
				.collect(),
			_ => self.properties.clone(),
		};

		NativeRow {
			partition_key: partition_key.to_string(),
			row_key: row_key.to_string(),
			etag: Some(self.etag.clone()),
			timestamp: Some(self.timestamp),
			properties,
		}
	}
}

/// The embedded in-process backend of the partitioned-table provider.
#[derive(Clone, Default)]
pub struct MemoryTableStoreDriver {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	tables: RwLock<HashMap<String, BTreeMap<RowKey, StoredRow>>>,
	page_size: PageSize,
}

struct PageSize(usize);

impl Default for PageSize {
	fn default() -> Self {
		Self(DEFAULT_PAGE_SIZE)
	}
}

impl MemoryTableStoreDriver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cap query segments at `page_size` rows; mainly for exercising
	/// continuation handling.
	pub fn with_page_size(page_size: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				tables: RwLock::new(HashMap::new()),
				page_size: PageSize(page_size.max(1)),
			}),
		}
	}

	fn new_etag() -> String {
		format!("W/\"{}\"", Uuid::new_v4())
	}
}

fn check_etag(provided: Option<&str>, stored: &StoredRow, partition_key: &str, row_key: &str) -> Result<()> {
	if let Some(tag) = provided
		&& tag != ETAG_ANY
		&& tag != stored.etag
	{
		return Err(Error::TokenMismatch {
			partition_key: partition_key.to_string(),
			row_key: row_key.to_string(),
		});
	}
	Ok(())
}

fn validate(rows: &BTreeMap<RowKey, StoredRow>, operation: &WriteOperation) -> Result<()> {
	let row = operation.row();
	let key = (row.partition_key.clone(), row.row_key.clone());

	match operation {
		WriteOperation::Insert(_) => {
			if rows.contains_key(&key) {
				return Err(Error::EntityAlreadyExists {
					partition_key: row.partition_key.clone(),
					row_key: row.row_key.clone(),
				});
			}
		}
		WriteOperation::Merge(_) | WriteOperation::Delete(_) => match rows.get(&key) {
			None => {
				return Err(Error::EntityNotFound {
					partition_key: row.partition_key.clone(),
					row_key: row.row_key.clone(),
				});
			}
			Some(stored) => check_etag(row.etag.as_deref(), stored, &row.partition_key, &row.row_key)?,
		},
		WriteOperation::InsertOrMerge(_) => {}
	}

	Ok(())
}

fn apply(rows: &mut BTreeMap<RowKey, StoredRow>, operation: WriteOperation, now: DateTime<Utc>) -> WriteResult {
	// Callers validate first; apply itself cannot fail.
	let etag = MemoryTableStoreDriver::new_etag();

	match operation {
		WriteOperation::Insert(row) => {
			rows.insert(
				(row.partition_key, row.row_key),
				StoredRow {
					etag: etag.clone(),
					timestamp: now,
					properties: row.properties,
				},
			);
			WriteResult {
				etag: Some(etag),
				timestamp: now,
			}
		}
		WriteOperation::Merge(row) => {
			let stored = rows.get_mut(&(row.partition_key, row.row_key)).expect("validated");
			stored.properties.extend(row.properties);
			stored.etag = etag.clone();
			stored.timestamp = now;
			WriteResult {
				etag: Some(etag),
				timestamp: now,
			}
		}
		WriteOperation::InsertOrMerge(row) => {
			let entry = rows.entry((row.partition_key, row.row_key));
			let stored = entry.or_insert_with(|| StoredRow {
				etag: String::new(),
				timestamp: now,
				properties: AttributeMap::new(),
			});
			stored.properties.extend(row.properties);
			stored.etag = etag.clone();
			stored.timestamp = now;
			WriteResult {
				etag: Some(etag),
				timestamp: now,
			}
		}
		WriteOperation::Delete(row) => {
			rows.remove(&(row.partition_key, row.row_key));
			WriteResult {
				etag: None,
				timestamp: now,
			}
		}
	}
}

#[async_trait]
impl TableStoreDriver for MemoryTableStoreDriver {
	#[instrument(name = "tablestore::memory::retrieve", level = "trace", skip(self, select))]
	async fn retrieve(
		&self,
		table: &str,
		partition_key: &str,
		row_key: &str,
		select: Option<&[String]>,
	) -> Result<Option<NativeRow>> {
		let tables = self.inner.tables.read().await;
		let Some(rows) = tables.get(table) else {
			return Ok(None);
		};

		Ok(rows
			.get(&(partition_key.to_string(), row_key.to_string()))
			.map(|stored| stored.to_row(partition_key, row_key, select)))
	}

	#[instrument(name = "tablestore::memory::execute", level = "debug", skip(self, operation), fields(table = table))]
	async fn execute(&self, table: &str, operation: WriteOperation) -> Result<WriteResult> {
		let mut tables = self.inner.tables.write().await;
		let rows = tables.entry(table.to_string()).or_default();

		validate(rows, &operation)?;
		Ok(apply(rows, operation, Utc::now()))
	}

	#[instrument(name = "tablestore::memory::execute_batch", level = "debug", skip(self, operations), fields(table = table, operations = operations.len()))]
	async fn execute_batch(&self, table: &str, operations: Vec<WriteOperation>) -> Result<Vec<WriteResult>> {
		let mut tables = self.inner.tables.write().await;
		let rows = tables.entry(table.to_string()).or_default();

		// Entity-group-transaction semantics: validate every operation
		// against the pre-batch state, then apply. A key may appear at
		// most once per batch.
		for operation in &operations {
			validate(rows, operation)?;
		}

		let now = Utc::now();
		Ok(operations.into_iter().map(|operation| apply(rows, operation, now)).collect())
	}

	#[instrument(name = "tablestore::memory::query_segment", level = "trace", skip(self, select, continuation), fields(table = table, partition_key = partition_key))]
	async fn query_segment(
		&self,
		table: &str,
		partition_key: &str,
		select: Option<&[String]>,
		continuation: Option<ContinuationToken>,
	) -> Result<RowSegment> {
		let tables = self.inner.tables.read().await;
		let Some(rows) = tables.get(table) else {
			return Ok(RowSegment::default());
		};

		let start: Bound<RowKey> = match continuation {
			Some(token) => Bound::Included((token.next_partition_key, token.next_row_key)),
			None => Bound::Included((partition_key.to_string(), String::new())),
		};

		let page_size = self.inner.page_size.0;
		// Fetch one extra row to decide whether another segment follows.
		let mut page: Vec<NativeRow> = rows
			.range((start, Bound::Unbounded))
			.take_while(|(key, _)| key.0 == partition_key)
			.take(page_size + 1)
			.map(|(key, stored)| stored.to_row(&key.0, &key.1, select))
			.collect();

		let continuation = if page.len() > page_size {
			let next = page.pop().expect("page holds the extra row");
			Some(ContinuationToken {
				next_partition_key: next.partition_key,
				next_row_key: next.row_key,
			})
		} else {
			None
		};

		Ok(RowSegment {
			rows: page,
			continuation,
		})
	}
}

#[cfg(test)]
mod tests {
	use polytable_core::Value;

	use super::*;

	fn row(partition_key: &str, row_key: &str, name: &str) -> NativeRow {
		let mut properties = AttributeMap::new();
		properties.insert("Name".to_string(), Value::Utf8(name.to_string()));
		NativeRow {
			partition_key: partition_key.to_string(),
			row_key: row_key.to_string(),
			etag: Some(ETAG_ANY.to_string()),
			timestamp: None,
			properties,
		}
	}

	#[tokio::test]
	async fn test_insert_and_retrieve() {
		let driver = MemoryTableStoreDriver::new();
		let result = driver.execute("t", WriteOperation::Insert(row("P1", "R1", "a"))).await.unwrap();
		assert!(result.etag.is_some());

		let stored = driver.retrieve("t", "P1", "R1", None).await.unwrap().unwrap();
		assert_eq!(stored.properties.get("Name"), Some(&Value::Utf8("a".to_string())));
		assert_eq!(stored.etag, result.etag);
		assert!(stored.timestamp.is_some());
	}

	#[tokio::test]
	async fn test_insert_existing_fails() {
		let driver = MemoryTableStoreDriver::new();
		driver.execute("t", WriteOperation::Insert(row("P1", "R1", "a"))).await.unwrap();

		let err = driver.execute("t", WriteOperation::Insert(row("P1", "R1", "b"))).await.unwrap_err();
		assert!(matches!(err, Error::EntityAlreadyExists { .. }));
	}

	#[tokio::test]
	async fn test_merge_retains_unlisted_properties() {
		let driver = MemoryTableStoreDriver::new();
		let mut first = row("P1", "R1", "a");
		first.properties.insert("Age".to_string(), Value::Int8(30));
		driver.execute("t", WriteOperation::Insert(first)).await.unwrap();

		driver.execute("t", WriteOperation::Merge(row("P1", "R1", "b"))).await.unwrap();

		let stored = driver.retrieve("t", "P1", "R1", None).await.unwrap().unwrap();
		assert_eq!(stored.properties.get("Name"), Some(&Value::Utf8("b".to_string())));
		assert_eq!(stored.properties.get("Age"), Some(&Value::Int8(30)));
	}

	#[tokio::test]
	async fn test_merge_missing_fails() {
		let driver = MemoryTableStoreDriver::new();
		let err = driver.execute("t", WriteOperation::Merge(row("P1", "R1", "a"))).await.unwrap_err();
		assert!(matches!(err, Error::EntityNotFound { .. }));
	}

	#[tokio::test]
	async fn test_stale_token_is_rejected() {
		let driver = MemoryTableStoreDriver::new();
		let first = driver.execute("t", WriteOperation::Insert(row("P1", "R1", "a"))).await.unwrap();
		driver.execute("t", WriteOperation::Merge(row("P1", "R1", "b"))).await.unwrap();

		let mut stale = row("P1", "R1", "c");
		stale.etag = first.etag;
		let err = driver.execute("t", WriteOperation::Merge(stale)).await.unwrap_err();
		assert!(matches!(err, Error::TokenMismatch { .. }));
	}

	#[tokio::test]
	async fn test_matching_token_is_accepted() {
		let driver = MemoryTableStoreDriver::new();
		let first = driver.execute("t", WriteOperation::Insert(row("P1", "R1", "a"))).await.unwrap();

		let mut current = row("P1", "R1", "b");
		current.etag = first.etag;
		driver.execute("t", WriteOperation::Merge(current)).await.unwrap();
	}

	#[tokio::test]
	async fn test_batch_applies_fully_or_not_at_all() {
		let driver = MemoryTableStoreDriver::new();
		driver.execute("t", WriteOperation::Insert(row("P1", "R2", "b"))).await.unwrap();

		let err = driver
			.execute_batch(
				"t",
				vec![
					WriteOperation::Insert(row("P1", "R1", "a")),
					// Occupied key: the whole batch must be rejected.
					WriteOperation::Insert(row("P1", "R2", "dup")),
				],
			)
			.await
			.unwrap_err();
		assert!(matches!(err, Error::EntityAlreadyExists { .. }));

		assert!(driver.retrieve("t", "P1", "R1", None).await.unwrap().is_none());
		let untouched = driver.retrieve("t", "P1", "R2", None).await.unwrap().unwrap();
		assert_eq!(untouched.properties.get("Name"), Some(&Value::Utf8("b".to_string())));
	}

	#[tokio::test]
	async fn test_query_segments_walk_the_partition() {
		let driver = MemoryTableStoreDriver::with_page_size(2);
		for key in ["R1", "R2", "R3", "R4", "R5"] {
			driver.execute("t", WriteOperation::Insert(row("P1", key, key))).await.unwrap();
		}
		driver.execute("t", WriteOperation::Insert(row("P2", "R1", "other"))).await.unwrap();

		let first = driver.query_segment("t", "P1", None, None).await.unwrap();
		assert_eq!(first.rows.len(), 2);
		assert!(first.continuation.is_some());

		let second = driver.query_segment("t", "P1", None, first.continuation).await.unwrap();
		assert_eq!(second.rows.len(), 2);

		let third = driver.query_segment("t", "P1", None, second.continuation).await.unwrap();
		assert_eq!(third.rows.len(), 1);
		assert!(third.continuation.is_none());

		let keys: Vec<String> = first
			.rows
			.iter()
			.chain(second.rows.iter())
			.chain(third.rows.iter())
			.map(|r| r.row_key.clone())
			.collect();
		assert_eq!(keys, vec!["R1", "R2", "R3", "R4", "R5"]);
	}

	#[tokio::test]
	async fn test_query_select_filters_columns() {
		let driver = MemoryTableStoreDriver::new();
		let mut seeded = row("P1", "R1", "a");
		seeded.properties.insert("Age".to_string(), Value::Int8(30));
		driver.execute("t", WriteOperation::Insert(seeded)).await.unwrap();

		let select = vec!["Name".to_string()];
		let segment = driver.query_segment("t", "P1", Some(&select), None).await.unwrap();
		let properties = &segment.rows[0].properties;
		assert!(properties.contains_key("Name"));
		assert!(!properties.contains_key("Age"));
	}
}
