// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::{Projection, Result, TableEntity};

/// Lazy, cancellable sequence of records produced by a partition read.
///
/// Nothing is fetched until the stream is polled; pages are fetched
/// strictly sequentially as items are consumed, and a fresh call to
/// [`TableClient::get_entities`] restarts the enumeration from the top.
pub type EntityStream<E> = Pin<Box<dyn Stream<Item = Result<E>> + Send>>;

/// The uniform table contract every provider adapter implements.
///
/// One operation call is one logical flow: all network waits are
/// suspension points, there is no shared mutable state behind a client
/// beyond its immutable configuration, and concurrent calls are
/// independent. Cancellation tokens are honored at iteration boundaries,
/// before staging the next record of a batch and before fetching the next
/// page of an enumeration; work already on the wire is not retracted.
///
/// Write operations mutate the passed record in place: a successful write
/// updates its last-modified timestamp, and its concurrency token where
/// the provider assigns one. Insert, update and delete default the token
/// to the wildcard (last write wins) unless the caller pre-set a real one;
/// upsert never touches it. Update carries merge semantics, not a full
/// overwrite. Batch variants submit items in caller-supplied order.
#[async_trait]
pub trait TableClient: Send + Sync {
	/// Point lookup. Absent keys yield `Ok(None)`, never an error.
	async fn get_entity<E: TableEntity>(
		&self,
		table: &str,
		partition_key: &str,
		row_key: &str,
		projection: Option<&Projection>,
		cancel: CancellationToken,
	) -> Result<Option<E>>;

	/// Enumerate every record under one partition, walking the provider's
	/// native pagination transparently.
	fn get_entities<E: TableEntity>(
		&self,
		table: &str,
		partition_key: &str,
		projection: Option<&Projection>,
		cancel: CancellationToken,
	) -> EntityStream<E>;

	async fn insert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()>;

	async fn insert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()>;

	async fn update_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()>;

	async fn update_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()>;

	async fn upsert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()>;

	async fn upsert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()>;

	async fn delete_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()>;

	async fn delete_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()>;
}
