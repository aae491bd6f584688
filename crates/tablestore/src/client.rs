// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{collections::HashMap, sync::Arc};

use async_stream::try_stream;
use async_trait::async_trait;
use polytable_core::{
	EntityStream, Error, Projection, Result, TableClient, TableEntity, TableOptions, codec, require_option,
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
	driver::{CONNECTION_STRING, NativeRow, TableStoreDriver, WriteOperation, WriteResult},
	memory::MemoryTableStoreDriver,
};

/// Provider adapter for the partitioned-table store.
///
/// Single-item operations go out as single wire calls; plural operations
/// build one native batch and submit it in a single call. Concurrency
/// tokens and timestamps are store-assigned and copied back onto the
/// records after every successful write.
pub struct TableStoreClient {
	driver: Arc<dyn TableStoreDriver>,
	diagnostics: bool,
}

impl std::fmt::Debug for TableStoreClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TableStoreClient")
			.field("diagnostics", &self.diagnostics)
			.finish_non_exhaustive()
	}
}

impl TableStoreClient {
	/// Construct from validated provider options.
	///
	/// `connection_string` is required. The workspace ships no wire
	/// bindings, so this wires the embedded in-memory backend; SDK-backed
	/// drivers come in through [`Self::with_driver`].
	pub fn connect(options: &HashMap<String, String>, settings: TableOptions) -> Result<Self> {
		let _connection = require_option(options, CONNECTION_STRING)?;
		Ok(Self::with_driver(Arc::new(MemoryTableStoreDriver::new()), settings))
	}

	pub fn with_driver(driver: Arc<dyn TableStoreDriver>, settings: TableOptions) -> Self {
		Self {
			driver,
			diagnostics: settings.enable_logging,
		}
	}

	fn write_row<E: TableEntity>(&self, entity: &E) -> NativeRow {
		NativeRow {
			partition_key: entity.partition_key().to_string(),
			row_key: entity.row_key().to_string(),
			etag: entity.etag().map(str::to_string),
			timestamp: None,
			properties: codec::serialize(entity, None, self.diagnostics),
		}
	}

	fn apply_result<E: TableEntity>(entity: &mut E, result: WriteResult) {
		let core = entity.core_mut();
		if let Some(etag) = result.etag {
			core.etag = Some(etag);
		}
		core.timestamp = Some(result.timestamp);
	}

	async fn execute_single<E: TableEntity>(
		&self,
		table: &str,
		entity: &mut E,
		cancel: CancellationToken,
		make: fn(NativeRow) -> WriteOperation,
		force_etag: bool,
	) -> Result<()> {
		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		if force_etag {
			entity.core_mut().ensure_etag();
		}

		let operation = make(self.write_row(entity));
		let result = self.driver.execute(table, operation).await?;
		Self::apply_result(entity, result);
		Ok(())
	}

	async fn execute_batch<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
		make: fn(NativeRow) -> WriteOperation,
		force_etag: bool,
	) -> Result<()> {
		let mut operations = Vec::with_capacity(entities.len());

		for entity in entities.iter_mut() {
			// Observed cancellation aborts the batch before any wire call.
			if cancel.is_cancelled() {
				return Err(Error::Cancelled);
			}

			if force_etag {
				entity.core_mut().ensure_etag();
			}
			operations.push(make(self.write_row(entity)));
		}

		let results = self.driver.execute_batch(table, operations).await?;
		for (entity, result) in entities.iter_mut().zip(results) {
			Self::apply_result(entity, result);
		}
		Ok(())
	}
}

fn row_to_entity<E: TableEntity>(row: NativeRow, projection: Option<&Projection>, diagnostics: bool) -> E {
	let mut entity: E = codec::deserialize(&row.partition_key, &row.row_key, &row.properties, projection, diagnostics);
	// Token and timestamp live in protocol-level slots, outside the
	// attribute bag; the store reports them regardless of projection.
	let core = entity.core_mut();
	core.etag = row.etag;
	core.timestamp = row.timestamp;
	entity
}

#[async_trait]
impl TableClient for TableStoreClient {
	#[instrument(name = "tablestore::get_entity", level = "debug", skip_all, fields(table = table, partition_key = partition_key, row_key = row_key))]
	async fn get_entity<E: TableEntity>(
		&self,
		table: &str,
		partition_key: &str,
		row_key: &str,
		projection: Option<&Projection>,
		cancel: CancellationToken,
	) -> Result<Option<E>> {
		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let select = projection.map(Projection::columns);
		let row = self.driver.retrieve(table, partition_key, row_key, select).await?;
		Ok(row.map(|row| row_to_entity(row, projection, self.diagnostics)))
	}

	fn get_entities<E: TableEntity>(
		&self,
		table: &str,
		partition_key: &str,
		projection: Option<&Projection>,
		cancel: CancellationToken,
	) -> EntityStream<E> {
		let driver = Arc::clone(&self.driver);
		let diagnostics = self.diagnostics;
		let table = table.to_string();
		let partition_key = partition_key.to_string();
		let projection = projection.cloned();

		Box::pin(try_stream! {
			let select: Option<Vec<String>> = projection.as_ref().map(|p| p.columns().to_vec());
			let mut continuation = None;

			loop {
				if cancel.is_cancelled() {
					Err(Error::Cancelled)?;
				}

				let segment = driver.query_segment(&table, &partition_key, select.as_deref(), continuation).await?;
				continuation = segment.continuation;

				for row in segment.rows {
					if cancel.is_cancelled() {
						Err(Error::Cancelled)?;
					}
					yield row_to_entity::<E>(row, projection.as_ref(), diagnostics);
				}

				if continuation.is_none() {
					break;
				}
			}
		})
	}

	#[instrument(name = "tablestore::insert_entity", level = "debug", skip_all, fields(table = table))]
	async fn insert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.execute_single(table, entity, cancel, WriteOperation::Insert, true).await
	}

	#[instrument(name = "tablestore::insert_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn insert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.execute_batch(table, entities, cancel, WriteOperation::Insert, true).await
	}

	#[instrument(name = "tablestore::update_entity", level = "debug", skip_all, fields(table = table))]
	async fn update_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.execute_single(table, entity, cancel, WriteOperation::Merge, true).await
	}

	#[instrument(name = "tablestore::update_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn update_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.execute_batch(table, entities, cancel, WriteOperation::Merge, true).await
	}

	#[instrument(name = "tablestore::upsert_entity", level = "debug", skip_all, fields(table = table))]
	async fn upsert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.execute_single(table, entity, cancel, WriteOperation::InsertOrMerge, false).await
	}

	#[instrument(name = "tablestore::upsert_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn upsert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.execute_batch(table, entities, cancel, WriteOperation::InsertOrMerge, false).await
	}

	#[instrument(name = "tablestore::delete_entity", level = "debug", skip_all, fields(table = table))]
	async fn delete_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.execute_single(table, entity, cancel, WriteOperation::Delete, true).await
	}

	#[instrument(name = "tablestore::delete_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn delete_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.execute_batch(table, entities, cancel, WriteOperation::Delete, true).await
	}
}
