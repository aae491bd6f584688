// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use core::fmt;

use async_trait::async_trait;
use polytable_core::{EntityStream, Projection, Result, TableClient, TableEntity};
use polytable_datastore::DatastoreClient;
use polytable_tablestore::TableStoreClient;
use tokio_util::sync::CancellationToken;

/// Unified client over every registered provider.
///
/// Application code holds one of these, built by the
/// [`ClientFactory`](crate::ClientFactory) from configuration, and never
/// needs to know which store is behind it.
pub enum Client {
	TableStore(TableStoreClient),
	Datastore(DatastoreClient),
}

impl Client {
	/// Registry name of the provider backing this client.
	pub const fn provider(&self) -> &'static str {
		match self {
			Self::TableStore(_) => polytable_tablestore::PROVIDER,
			Self::Datastore(_) => polytable_datastore::PROVIDER,
		}
	}
}

impl fmt::Debug for Client {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Client").field("provider", &self.provider()).finish()
	}
}

#[async_trait]
impl TableClient for Client {
	#[inline]
	async fn get_entity<E: TableEntity>(
		&self,
		table: &str,
		partition_key: &str,
		row_key: &str,
		projection: Option<&Projection>,
		cancel: CancellationToken,
	) -> Result<Option<E>> {
		match self {
			Self::TableStore(client) => client.get_entity(table, partition_key, row_key, projection, cancel).await,
			Self::Datastore(client) => client.get_entity(table, partition_key, row_key, projection, cancel).await,
		}
	}

	#[inline]
	fn get_entities<E: TableEntity>(
		&self,
		table: &str,
		partition_key: &str,
		projection: Option<&Projection>,
		cancel: CancellationToken,
	) -> EntityStream<E> {
		match self {
			Self::TableStore(client) => client.get_entities(table, partition_key, projection, cancel),
			Self::Datastore(client) => client.get_entities(table, partition_key, projection, cancel),
		}
	}

	#[inline]
	async fn insert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		match self {
			Self::TableStore(client) => client.insert_entity(table, entity, cancel).await,
			Self::Datastore(client) => client.insert_entity(table, entity, cancel).await,
		}
	}

	#[inline]
	async fn insert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		match self {
			Self::TableStore(client) => client.insert_entities(table, entities, cancel).await,
			Self::Datastore(client) => client.insert_entities(table, entities, cancel).await,
		}
	}

	#[inline]
	async fn update_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		match self {
			Self::TableStore(client) => client.update_entity(table, entity, cancel).await,
			Self::Datastore(client) => client.update_entity(table, entity, cancel).await,
		}
	}

	#[inline]
	async fn update_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		match self {
			Self::TableStore(client) => client.update_entities(table, entities, cancel).await,
			Self::Datastore(client) => client.update_entities(table, entities, cancel).await,
		}
	}

	#[inline]
	async fn upsert_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		match self {
			Self::TableStore(client) => client.upsert_entity(table, entity, cancel).await,
			Self::Datastore(client) => client.upsert_entity(table, entity, cancel).await,
		}
	}

	#[inline]
	async fn upsert_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		match self {
			Self::TableStore(client) => client.upsert_entities(table, entities, cancel).await,
			Self::Datastore(client) => client.upsert_entities(table, entities, cancel).await,
		}
	}

	#[inline]
	async fn delete_entity<E: TableEntity>(&self, table: &str, entity: &mut E, cancel: CancellationToken) -> Result<()> {
		match self {
			Self::TableStore(client) => client.delete_entity(table, entity, cancel).await,
			Self::Datastore(client) => client.delete_entity(table, entity, cancel).await,
		}
	}

	#[inline]
	async fn delete_entities<E: TableEntity>(
		&self,
		table: &str,
		entities: &mut [E],
		cancel: CancellationToken,
	) -> Result<()> {
		match self {
			Self::TableStore(client) => client.delete_entities(table, entities, cancel).await,
			Self::Datastore(client) => client.delete_entities(table, entities, cancel).await,
		}
	}
}
