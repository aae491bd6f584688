// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

//! Bidirectional mapping between typed records and neutral attribute maps.
//!
//! Both provider adapters funnel through this module: serialization walks a
//! record's field descriptors into a `BTreeMap` (deterministic attribute
//! order), deserialization walks the descriptors back over a map a driver
//! produced. The skip rules (key attributes, projection filtering, ignore
//! flags) are applied identically in both directions.
//!
//! Mapping gaps are deliberately silent: an attribute whose wire type does
//! not fit the target field leaves the field untouched, and an attribute
//! missing entirely leaves the field at its default. With diagnostics
//! enabled the gaps are logged, nothing more. Callers wanting strict schema
//! validation must layer it on top.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
	entity::{PARTITION_KEY, ROW_KEY, TableEntity},
	projection::Projection,
	value::Value,
};

/// Neutral attribute representation both providers translate to and from.
pub type AttributeMap = BTreeMap<String, Value>;

/// Marshal a record's eligible fields into an attribute map.
///
/// Key fields never appear: they map to dedicated store-level key slots.
/// A non-empty projection restricts the output to the named fields. The
/// result is deterministic for a given record and projection.
pub fn serialize<E: TableEntity>(entity: &E, projection: Option<&Projection>, diagnostics: bool) -> AttributeMap {
	let mut attributes = AttributeMap::new();

	for spec in E::fields() {
		if should_skip(spec.name, spec.ignore, projection, diagnostics) {
			continue;
		}

		attributes.insert(spec.name.to_string(), (spec.get)(entity));
	}

	attributes
}

/// Materialize a record from a driver-produced attribute map and the
/// store's authoritative key pair.
///
/// The record is allocated through the shape's two-argument factory with
/// empty placeholders; the key fields are overwritten last so nothing in
/// the generic mapping pass can disturb them. Absent attributes leave
/// fields at their defaults, typed nulls clear them, mismatched wire types
/// are skipped. This never fails partway through.
pub fn deserialize<E: TableEntity>(
	partition_key: &str,
	row_key: &str,
	attributes: &AttributeMap,
	projection: Option<&Projection>,
	diagnostics: bool,
) -> E {
	let mut entity = E::new(String::new(), String::new());

	for spec in E::fields() {
		if should_skip(spec.name, spec.ignore, projection, diagnostics) {
			continue;
		}

		match attributes.get(spec.name) {
			None => {
				if diagnostics {
					debug!(field = spec.name, "no attribute for field, leaving default");
				}
			}
			Some(value) => {
				let applied = (spec.set)(&mut entity, value);
				if !applied && diagnostics {
					debug!(
						field = spec.name,
						expected = ?spec.ty,
						actual = ?value.ty(),
						"attribute type mismatch, leaving field untouched"
					);
				}
			}
		}
	}

	let core = entity.core_mut();
	core.partition_key = partition_key.to_string();
	core.row_key = row_key.to_string();

	entity
}

/// The shared eligibility rules of both mapping directions.
fn should_skip(name: &str, ignore: bool, projection: Option<&Projection>, diagnostics: bool) -> bool {
	if name == PARTITION_KEY || name == ROW_KEY {
		return true;
	}

	if let Some(projection) = projection
		&& !projection.is_empty()
		&& !projection.contains(name)
	{
		return true;
	}

	if ignore {
		if diagnostics {
			debug!(field = name, "field marked ignore, skipping");
		}
		return true;
	}

	false
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Utc};
	use uuid::Uuid;

	use super::*;
	use crate::{EntityCore, FieldSpec, entity_fields};

	#[derive(Clone, Debug, Default, PartialEq)]
	struct Person {
		core: EntityCore,
		name: Option<String>,
		age: Option<i64>,
		score: Option<f64>,
		active: bool,
		joined: Option<chrono::DateTime<Utc>>,
		avatar: Option<Vec<u8>>,
		device: Option<Uuid>,
		secret: Option<String>,
	}

	impl TableEntity for Person {
		fn new(partition_key: String, row_key: String) -> Self {
			Self {
				core: EntityCore::new(partition_key, row_key),
				..Self::default()
			}
		}

		fn core(&self) -> &EntityCore {
			&self.core
		}

		fn core_mut(&mut self) -> &mut EntityCore {
			&mut self.core
		}

		fn fields() -> &'static [FieldSpec<Self>] {
			entity_fields!(Person {
				"Name" => name: Utf8,
				"Age" => age: Int8,
				"Score" => score: Float8,
				"Active" => active: Boolean,
				"Joined" => joined: DateTimeOffset,
				"Avatar" => avatar: Blob,
				"Device" => device: Uuid,
				"Secret" => secret: Utf8 ignore,
			})
		}
	}

	fn sample() -> Person {
		let mut person = Person::new("P1".into(), "R1".into());
		person.name = Some("a".to_string());
		person.age = Some(30);
		person.score = Some(4.5);
		person.active = true;
		person.joined = Some(Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap());
		person.avatar = Some(vec![1, 2, 3]);
		person.device = Some(Uuid::new_v4());
		person.secret = Some("hidden".to_string());
		person
	}

	#[test]
	fn test_round_trip() {
		let person = sample();
		let attributes = serialize(&person, None, false);
		let back: Person = deserialize("P1", "R1", &attributes, None, false);

		assert_eq!(back.name, person.name);
		assert_eq!(back.age, person.age);
		assert_eq!(back.score, person.score);
		assert_eq!(back.active, person.active);
		assert_eq!(back.joined, person.joined);
		assert_eq!(back.avatar, person.avatar);
		assert_eq!(back.device, person.device);
		assert_eq!(back.partition_key(), "P1");
		assert_eq!(back.row_key(), "R1");
		// Ignored fields stay at default on both sides.
		assert_eq!(back.secret, None);
	}

	#[test]
	fn test_projection_containment() {
		let person = sample();
		let projection = Projection::new(["Name", "Age"]);
		let attributes = serialize(&person, Some(&projection), false);

		let keys: Vec<&str> = attributes.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["Age", "Name"]);
	}

	#[test]
	fn test_empty_projection_means_all() {
		let person = sample();
		let all = serialize(&person, None, false);
		let empty = serialize(&person, Some(&Projection::default()), false);
		assert_eq!(all, empty);
		assert_eq!(all.len(), 7);
	}

	#[test]
	fn test_key_fields_never_serialize_as_attributes() {
		let attributes = serialize(&sample(), None, false);
		assert!(!attributes.contains_key(PARTITION_KEY));
		assert!(!attributes.contains_key(ROW_KEY));
	}

	#[test]
	fn test_ignored_field_is_skipped() {
		let attributes = serialize(&sample(), None, false);
		assert!(!attributes.contains_key("Secret"));

		let mut attributes = attributes;
		attributes.insert("Secret".to_string(), Value::Utf8("planted".to_string()));
		let back: Person = deserialize("P1", "R1", &attributes, None, false);
		assert_eq!(back.secret, None);
	}

	#[test]
	fn test_projected_out_fields_keep_defaults() {
		let person = sample();
		let attributes = serialize(&person, None, false);
		let projection = Projection::new(["Name"]);
		let back: Person = deserialize("P1", "R1", &attributes, Some(&projection), false);

		assert_eq!(back.name, person.name);
		assert_eq!(back.age, None);
		assert_eq!(back.score, None);
		assert!(!back.active);
	}

	#[test]
	fn test_absent_attribute_leaves_default() {
		let back: Person = deserialize("P1", "R1", &AttributeMap::new(), None, false);
		assert_eq!(back.name, None);
		assert_eq!(back.age, None);
		assert_eq!(back.partition_key(), "P1");
	}

	#[test]
	fn test_typed_null_clears_field() {
		let mut attributes = serialize(&sample(), None, false);
		attributes.insert("Name".to_string(), Value::Null);
		let back: Person = deserialize("P1", "R1", &attributes, None, false);
		assert_eq!(back.name, None);
	}

	#[test]
	fn test_type_mismatch_leaves_field_untouched() {
		let mut attributes = serialize(&sample(), None, false);
		attributes.insert("Age".to_string(), Value::Utf8("thirty".to_string()));
		attributes.insert("Active".to_string(), Value::Int8(1));
		let back: Person = deserialize("P1", "R1", &attributes, None, false);

		assert_eq!(back.age, None);
		assert!(!back.active);
		// The rest of the mapping pass is unaffected.
		assert_eq!(back.name, Some("a".to_string()));
	}

	#[test]
	fn test_store_key_overrides_planted_key_attributes() {
		let mut attributes = serialize(&sample(), None, false);
		attributes.insert(PARTITION_KEY.to_string(), Value::Utf8("evil".to_string()));
		attributes.insert(ROW_KEY.to_string(), Value::Utf8("evil".to_string()));
		let back: Person = deserialize("P2", "R2", &attributes, None, false);

		assert_eq!(back.partition_key(), "P2");
		assert_eq!(back.row_key(), "R2");
	}

	#[test]
	fn test_serialize_is_deterministic() {
		let person = sample();
		let first: Vec<String> = serialize(&person, None, false).into_keys().collect();
		let second: Vec<String> = serialize(&person, None, false).into_keys().collect();
		assert_eq!(first, second);
	}

	#[test]
	fn test_integer_widening_round_trips_through_int8() {
		// The document store widens Int4 to Int8 on the wire; the field
		// still narrows back on read.
		let mut attributes = AttributeMap::new();
		attributes.insert("Age".to_string(), Value::Int4(12));
		let back: Person = deserialize("P1", "R1", &attributes, None, false);
		assert_eq!(back.age, Some(12));
	}
}
