// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! In-memory implementation of the document-store wire surface.
//!
//! Transactions buffer mutations locally; commit takes the write lock
//! once, validates every staged mutation against the pre-commit state and
//! only then applies them, so a failing mutation leaves nothing behind.
//! Timestamps are stored exactly as transmitted, since this store has no
//! server-side clock, but offset-less date/time values are normalized to
//! the offset flavor, the way the real store collapses both onto one wire
//! type.

use std::{
	collections::{BTreeMap, HashMap},
	ops::Bound,
	sync::Arc,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use polytable_core::{Error, Result, Value};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::driver::{Cursor, DatastoreDriver, DatastoreTransaction, EntityKey, EntityPage, NativeEntity, Property};

const DEFAULT_PAGE_SIZE: usize = 300;

type Entities = BTreeMap<EntityKey, BTreeMap<String, Property>>;

/// The embedded in-process backend of the document provider.
#[derive(Clone, Default)]
pub struct MemoryDatastoreDriver {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	namespaces: RwLock<HashMap<String, Entities>>,
	page_size: PageSize,
}

struct PageSize(usize);

impl Default for PageSize {
	fn default() -> Self {
		Self(DEFAULT_PAGE_SIZE)
	}
}

impl MemoryDatastoreDriver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cap query pages at `page_size` entities; mainly for exercising
	/// cursor handling.
	pub fn with_page_size(page_size: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				namespaces: RwLock::new(HashMap::new()),
				page_size: PageSize(page_size.max(1)),
			}),
		}
	}
}

#[derive(Debug)]
enum Mutation {
	Insert(NativeEntity),
	Update(NativeEntity),
	Upsert(NativeEntity),
	Delete(EntityKey),
}

struct MemoryTransaction {
	inner: Arc<Inner>,
	namespace: String,
	mutations: Vec<Mutation>,
}

fn normalize(mut entity: NativeEntity) -> NativeEntity {
	// The wire carries a single timestamp type.
	for property in entity.properties.values_mut() {
		if let Value::DateTime(naive) = property.value {
			property.value = Value::DateTimeOffset(Utc.from_utc_datetime(&naive));
		}
	}
	entity
}

fn merge(entities: &mut Entities, entity: NativeEntity) {
	let entity = normalize(entity);
	entities.entry(entity.key).or_default().extend(entity.properties);
}

#[async_trait]
impl DatastoreTransaction for MemoryTransaction {
	fn insert(&mut self, entity: NativeEntity) {
		self.mutations.push(Mutation::Insert(entity));
	}

	fn update(&mut self, entity: NativeEntity) {
		self.mutations.push(Mutation::Update(entity));
	}

	fn upsert(&mut self, entity: NativeEntity) {
		self.mutations.push(Mutation::Upsert(entity));
	}

	fn delete(&mut self, key: EntityKey) {
		self.mutations.push(Mutation::Delete(key));
	}

	#[instrument(name = "datastore::memory::commit", level = "debug", skip(self), fields(namespace = %self.namespace, mutations = self.mutations.len()))]
	async fn commit(self: Box<Self>) -> Result<()> {
		let Self {
			inner,
			namespace,
			mutations,
		} = *self;

		let mut namespaces = inner.namespaces.write().await;
		let entities = namespaces.entry(namespace).or_default();

		// All-or-nothing: validate every mutation against the pre-commit
		// state before applying any. A key may be the target of at most
		// one mutation per transaction.
		for mutation in &mutations {
			match mutation {
				Mutation::Insert(entity) => {
					if entities.contains_key(&entity.key) {
						return Err(Error::EntityAlreadyExists {
							partition_key: entity.key.kind.clone(),
							row_key: entity.key.name.clone(),
						});
					}
				}
				Mutation::Update(entity) => {
					if !entities.contains_key(&entity.key) {
						return Err(Error::EntityNotFound {
							partition_key: entity.key.kind.clone(),
							row_key: entity.key.name.clone(),
						});
					}
				}
				Mutation::Delete(key) => {
					if !entities.contains_key(key) {
						return Err(Error::EntityNotFound {
							partition_key: key.kind.clone(),
							row_key: key.name.clone(),
						});
					}
				}
				Mutation::Upsert(_) => {}
			}
		}

		for mutation in mutations {
			match mutation {
				Mutation::Insert(entity) | Mutation::Update(entity) | Mutation::Upsert(entity) => {
					merge(entities, entity);
				}
				Mutation::Delete(key) => {
					entities.remove(&key);
				}
			}
		}

		Ok(())
	}
}

#[async_trait]
impl DatastoreDriver for MemoryDatastoreDriver {
	#[instrument(name = "datastore::memory::lookup", level = "trace", skip(self, key), fields(namespace = namespace, kind = %key.kind, name = %key.name))]
	async fn lookup(&self, namespace: &str, key: &EntityKey) -> Result<Option<NativeEntity>> {
		let namespaces = self.inner.namespaces.read().await;
		let Some(entities) = namespaces.get(namespace) else {
			return Ok(None);
		};

		Ok(entities.get(key).map(|properties| NativeEntity {
			key: key.clone(),
			properties: properties.clone(),
		}))
	}

	async fn begin_transaction(&self, namespace: &str) -> Result<Box<dyn DatastoreTransaction>> {
		Ok(Box::new(MemoryTransaction {
			inner: Arc::clone(&self.inner),
			namespace: namespace.to_string(),
			mutations: Vec::new(),
		}))
	}

	#[instrument(name = "datastore::memory::query_page", level = "trace", skip(self, cursor), fields(namespace = namespace, kind = kind))]
	async fn query_page(&self, namespace: &str, kind: &str, cursor: Option<Cursor>) -> Result<EntityPage> {
		let namespaces = self.inner.namespaces.read().await;
		let Some(entities) = namespaces.get(namespace) else {
			return Ok(EntityPage::default());
		};

		let start: Bound<EntityKey> = match cursor {
			Some(cursor) => Bound::Excluded(EntityKey::new(kind, cursor.0)),
			None => Bound::Included(EntityKey::new(kind, String::new())),
		};

		let page_size = self.inner.page_size.0;
		// Fetch one extra entity to decide whether another page follows.
		let mut page: Vec<NativeEntity> = entities
			.range((start, Bound::Unbounded))
			.take_while(|(key, _)| key.kind == kind)
			.take(page_size + 1)
			.map(|(key, properties)| NativeEntity {
				key: key.clone(),
				properties: properties.clone(),
			})
			.collect();

		let cursor = if page.len() > page_size {
			page.pop();
			page.last().map(|entity| Cursor(entity.key.name.clone()))
		} else {
			None
		};

		Ok(EntityPage {
			entities: page,
			cursor,
		})
	}
}
