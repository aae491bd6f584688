// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! Translation between the neutral attribute map and native entities.
//!
//! On top of the shared codec this layer adds what is specific to the
//! document store: the concurrency token and timestamp travel as ordinary
//! properties (the store has no system slots for them), and oversized
//! text/blob values are marked index-excluded.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use polytable_core::{ETAG, Projection, TIMESTAMP, TableEntity, Value, codec, codec::AttributeMap};

use crate::driver::{EntityKey, NativeEntity, Property};

pub(crate) fn to_properties(attributes: AttributeMap) -> BTreeMap<String, Property> {
	attributes.into_iter().map(|(name, value)| (name, Property::from_value(value))).collect()
}

pub(crate) fn from_properties(properties: &BTreeMap<String, Property>) -> AttributeMap {
	properties.iter().map(|(name, property)| (name.clone(), property.value.clone())).collect()
}

/// Marshal a record into a native entity, appending the system fields as
/// ordinary attributes.
pub(crate) fn write_entity<E: TableEntity>(entity: &E, diagnostics: bool) -> NativeEntity {
	let mut attributes = codec::serialize(entity, None, diagnostics);

	attributes.insert(
		ETAG.to_string(),
		match entity.etag() {
			Some(tag) => Value::Utf8(tag.to_string()),
			None => Value::Null,
		},
	);
	attributes.insert(
		TIMESTAMP.to_string(),
		match entity.timestamp() {
			Some(timestamp) => Value::DateTimeOffset(timestamp),
			None => Value::Null,
		},
	);

	NativeEntity {
		key: EntityKey::new(entity.partition_key(), entity.row_key()),
		properties: to_properties(attributes),
	}
}

/// Materialize a record from a native entity.
///
/// The store's key is authoritative: kind becomes the partition key, the
/// key name becomes the row key. System attributes are restored subject to
/// the same projection rules as any other field.
pub(crate) fn read_entity<E: TableEntity>(
	native: &NativeEntity,
	projection: Option<&Projection>,
	diagnostics: bool,
) -> E {
	let attributes = from_properties(&native.properties);
	let mut entity: E = codec::deserialize(&native.key.kind, &native.key.name, &attributes, projection, diagnostics);

	let allows = |name: &str| projection.is_none_or(|projection| projection.allows(name));

	if allows(ETAG)
		&& let Some(Value::Utf8(tag)) = attributes.get(ETAG)
	{
		entity.core_mut().etag = Some(tag.clone());
	}

	if allows(TIMESTAMP) {
		match attributes.get(TIMESTAMP) {
			Some(Value::DateTimeOffset(timestamp)) => entity.core_mut().timestamp = Some(*timestamp),
			Some(Value::DateTime(naive)) => entity.core_mut().timestamp = Some(Utc.from_utc_datetime(naive)),
			_ => {}
		}
	}

	entity
}
