// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! The wire surface a kind/key document SDK client must expose.

use std::collections::BTreeMap;

use async_trait::async_trait;
use polytable_core::{Result, Value};

/// Registry name of this provider.
pub const PROVIDER: &str = "datastore";

/// Option key carrying the project identifier; required at construction.
pub const PROJECT_ID: &str = "project_id";

/// Identity of a stored entity: its kind plus the key name inside it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
	pub kind: String,
	pub name: String,
}

impl EntityKey {
	pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			name: name.into(),
		}
	}
}

/// A native attribute: the value plus the store's indexing hint.
///
/// `exclude_from_indexes` only affects queryability, never the value
/// itself; it is set for text and blob values over the indexed-size
/// ceiling.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
	pub value: Value,
	pub exclude_from_indexes: bool,
}

impl Property {
	/// Wrap a value, marking it index-excluded when oversized.
	pub fn from_value(value: Value) -> Self {
		let exclude_from_indexes = value.exceeds_index_limit();
		Self {
			value,
			exclude_from_indexes,
		}
	}
}

/// An entity as the store sees it: key plus property bag. Unlike the
/// partitioned-table store there are no system slots; everything beyond
/// the key is an ordinary property.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeEntity {
	pub key: EntityKey,
	pub properties: BTreeMap<String, Property>,
}

/// Opaque query position marker handed back with each result page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor(pub String);

/// One page of a kind query plus the cursor of the next page, if any.
#[derive(Debug, Default)]
pub struct EntityPage {
	pub entities: Vec<NativeEntity>,
	pub cursor: Option<Cursor>,
}

/// Minimal async client surface of the document store.
#[async_trait]
pub trait DatastoreDriver: Send + Sync {
	/// Point lookup by key. Queries return full entities; any column
	/// projection is applied client-side after deserialization.
	async fn lookup(&self, namespace: &str, key: &EntityKey) -> Result<Option<NativeEntity>>;

	/// Open a transaction; mutations are staged locally and take effect
	/// only on commit.
	async fn begin_transaction(&self, namespace: &str) -> Result<Box<dyn DatastoreTransaction>>;

	/// Fetch one page of the entities of a kind, in stable key order,
	/// resuming from `cursor` when given.
	async fn query_page(&self, namespace: &str, kind: &str, cursor: Option<Cursor>) -> Result<EntityPage>;
}

/// A staged unit of work against the document store.
///
/// Staging never touches the wire. Commit applies every staged mutation
/// atomically: either all of them take effect or none do. A key may be
/// the target of at most one mutation per transaction.
#[async_trait]
pub trait DatastoreTransaction: Send {
	/// Stage a create; commit fails if the key is occupied.
	fn insert(&mut self, entity: NativeEntity);

	/// Stage an attribute merge into an existing entity; commit fails if
	/// the key is absent.
	fn update(&mut self, entity: NativeEntity);

	/// Stage a merge-or-create.
	fn upsert(&mut self, entity: NativeEntity);

	/// Stage a removal; commit fails if the key is absent.
	fn delete(&mut self, key: EntityKey);

	async fn commit(self: Box<Self>) -> Result<()>;
}
