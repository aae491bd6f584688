// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{collections::HashMap, sync::Arc};

use async_stream::try_stream;
use async_trait::async_trait;
use chrono::Utc;
use polytable_core::{
	EntityStream, Error, Projection, Result, TableClient, TableEntity, TableOptions, require_option,
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
	codec::{read_entity, write_entity},
	driver::{DatastoreDriver, EntityKey, NativeEntity, PROJECT_ID},
	memory::MemoryDatastoreDriver,
};

/// How a staged record enters its transaction.
#[derive(Clone, Copy)]
enum WriteMode {
	Insert,
	Update,
	Upsert,
	Delete,
}

/// Provider adapter for the kind/key document store.
///
/// Every operation, single or plural, is an explicit transaction:
/// begin, stage, commit. A plural batch stages all records into one
/// transaction and commits atomically. The store assigns no tokens and no
/// server timestamps; the adapter stamps each record's timestamp
/// client-side just before serialization.
pub struct DatastoreClient {
	driver: Arc<dyn DatastoreDriver>,
	diagnostics: bool,
}

impl std::fmt::Debug for DatastoreClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DatastoreClient")
			.field("diagnostics", &self.diagnostics)
			.finish_non_exhaustive()
	}
}

impl DatastoreClient {
	/// Construct from validated provider options.
	///
	/// `project_id` is required. The workspace ships no wire bindings, so
	/// this wires the embedded in-memory backend; SDK-backed drivers come
	/// in through [`Self::with_driver`].
	pub fn connect(options: &HashMap<String, String>, settings: TableOptions) -> Result<Self> {
		let _project = require_option(options, PROJECT_ID)?;
		Ok(Self::with_driver(Arc::new(MemoryDatastoreDriver::new()), settings))
	}

	pub fn with_driver(driver: Arc<dyn DatastoreDriver>, settings: TableOptions) -> Self {
		Self {
			driver,
			diagnostics: settings.enable_logging,
		}
	}

	fn stage_record<E: TableEntity>(&self, entity: &mut E, force_etag: bool) -> NativeEntity {
		if force_etag {
			entity.core_mut().ensure_etag();
		}
		// No server-side clock here: the write time is stamped before
		// transmission and travels as an ordinary attribute.
		entity.core_mut().timestamp = Some(Utc::now());
		write_entity(entity, self.diagnostics)
	}

	async fn commit_single<E: TableEntity>(
		&self,
		table: &str,
		entity: &mut E,
		cancel: CancellationToken,
		mode: WriteMode,
		force_etag: bool,
	) -> Result<()> {
		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let native = self.stage_record(entity, force_etag);
		let mut transaction = self.driver.begin_transaction(table).await?;
		stage(&mut *transaction, mode, native);
		transaction.commit().await
	}

	async fn commit_batch<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
		mode: WriteMode,
		force_etag: bool,
	) -> Result<()> {
		let mut staged = Vec::with_capacity(entities.len());

		for entity in entities.iter_mut() {
			// Observed cancellation aborts the batch before any wire call.
			if cancel.is_cancelled() {
				return Err(Error::Cancelled);
			}
			staged.push(self.stage_record(entity, force_etag));
		}

		let mut transaction = self.driver.begin_transaction(table).await?;
		for native in staged {
			stage(&mut *transaction, mode, native);
		}
		transaction.commit().await
	}
}

fn stage(transaction: &mut dyn crate::driver::DatastoreTransaction, mode: WriteMode, native: NativeEntity) {
	match mode {
		WriteMode::Insert => transaction.insert(native),
		WriteMode::Update => transaction.update(native),
		WriteMode::Upsert => transaction.upsert(native),
		WriteMode::Delete => transaction.delete(native.key),
	}
}

#[async_trait]
impl TableClient for DatastoreClient {
	#[instrument(name = "datastore::get_entity", level = "debug", skip_all, fields(table = table, partition_key = partition_key, row_key = row_key))]
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

		let key = EntityKey::new(partition_key, row_key);
		let native = self.driver.lookup(table, &key).await?;
		Ok(native.map(|native| read_entity(&native, projection, self.diagnostics)))
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
		let namespace = table.to_string();
		let kind = partition_key.to_string();
		let projection = projection.cloned();

		Box::pin(try_stream! {
			let mut cursor = None;

			loop {
				if cancel.is_cancelled() {
					Err(Error::Cancelled)?;
				}

				let page = driver.query_page(&namespace, &kind, cursor).await?;
				cursor = page.cursor;

				for native in page.entities {
					if cancel.is_cancelled() {
						Err(Error::Cancelled)?;
					}
					// Queries return full entities; the projection is
					// applied here, client-side.
					yield read_entity::<E>(&native, projection.as_ref(), diagnostics);
				}

				if cursor.is_none() {
					break;
				}
			}
		})
	}

	#[instrument(name = "datastore::insert_entity", level = "debug", skip_all, fields(table = table))]
	async fn insert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.commit_single(table, entity, cancel, WriteMode::Insert, true).await
	}

	#[instrument(name = "datastore::insert_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn insert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.commit_batch(table, entities, cancel, WriteMode::Insert, true).await
	}

	#[instrument(name = "datastore::update_entity", level = "debug", skip_all, fields(table = table))]
	async fn update_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.commit_single(table, entity, cancel, WriteMode::Update, true).await
	}

	#[instrument(name = "datastore::update_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn update_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.commit_batch(table, entities, cancel, WriteMode::Update, true).await
	}

	#[instrument(name = "datastore::upsert_entity", level = "debug", skip_all, fields(table = table))]
	async fn upsert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.commit_single(table, entity, cancel, WriteMode::Upsert, false).await
	}

	#[instrument(name = "datastore::upsert_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn upsert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.commit_batch(table, entities, cancel, WriteMode::Upsert, false).await
	}

	#[instrument(name = "datastore::delete_entity", level = "debug", skip_all, fields(table = table))]
	async fn delete_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		self.commit_single(table, entity, cancel, WriteMode::Delete, true).await
	}

	#[instrument(name = "datastore::delete_entities", level = "debug", skip_all, fields(table = table, count = entities.len()))]
	async fn delete_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		self.commit_batch(table, entities, cancel, WriteMode::Delete, true).await
	}
}
