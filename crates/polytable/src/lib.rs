// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! Provider-agnostic cloud table layer.
//!
//! One typed `get` / `insert` / `update` / `upsert` / `delete` contract
//! over interchangeable backing stores: a partitioned-table store
//! (`"tablestore"`) and a kind/key document store (`"datastore"`). The
//! provider is chosen by configuration at construction time; application
//! code only ever sees the [`TableClient`] contract.
//!
//! Records are plain structs embedding an [`EntityCore`] (the two-part
//! key, the concurrency token and the last-modified timestamp) plus a
//! static field descriptor list, typically declared with
//! [`entity_fields!`]:
//!
//! ```
//! use polytable::{
//! 	CancellationToken, ClientFactory, EntityCore, FieldSpec, ProviderOptions, TableClient,
//! 	TableEntity, entity_fields,
//! };
//!
//! #[derive(Clone, Debug, Default)]
//! struct Person {
//! 	core: EntityCore,
//! 	name: Option<String>,
//! 	age: Option<i64>,
//! }
//!
//! impl TableEntity for Person {
//! 	fn new(partition_key: String, row_key: String) -> Self {
//! 		Self { core: EntityCore::new(partition_key, row_key), ..Self::default() }
//! 	}
//!
//! 	fn core(&self) -> &EntityCore {
//! 		&self.core
//! 	}
//!
//! 	fn core_mut(&mut self) -> &mut EntityCore {
//! 		&mut self.core
//! 	}
//!
//! 	fn fields() -> &'static [FieldSpec<Self>] {
//! 		entity_fields!(Person {
//! 			"Name" => name: Utf8,
//! 			"Age" => age: Int8,
//! 		})
//! 	}
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> polytable::Result<()> {
//! let factory = ClientFactory::new();
//! let options = ProviderOptions::new("tablestore").with_option("connection_string", "endpoint=embedded");
//! let client = factory.create(&options)?;
//!
//! let mut person = Person::new("team".into(), "alice".into());
//! person.name = Some("Alice".into());
//! client.insert_entity("people", &mut person, CancellationToken::new()).await?;
//!
//! let fetched: Option<Person> =
//! 	client.get_entity("people", "team", "alice", None, CancellationToken::new()).await?;
//! assert_eq!(fetched.unwrap().name.as_deref(), Some("Alice"));
//! # Ok(())
//! # }
//! ```
//!
//! Swapping the backing store is a configuration change, `"datastore"`
//! plus its `project_id` option, and nothing else moves.

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod client;
mod factory;

pub use client::Client;
pub use factory::{ClientFactory, providers};
pub use polytable_core::{
	ETAG, ETAG_ANY, EntityCore, EntityStream, Error, FieldSpec, FieldType, FieldValue, MAX_INDEXED_VALUE_SIZE,
	PARTITION_KEY, Projection, ProviderOptions, ROW_KEY, Result, TIMESTAMP, TableClient, TableEntity, TableOptions,
	Value, codec, entity_fields,
};
pub use tokio_util::sync::CancellationToken;

pub use polytable_datastore as datastore;
pub use polytable_tablestore as tablestore;
