// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use std::fmt::{self, Debug, Formatter};

use crate::value::Value;

/// Type tag of a described field, one per entry in the value type table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
	Utf8,
	Blob,
	Boolean,
	DateTime,
	DateTimeOffset,
	Float8,
	Int4,
	Int8,
	Uuid,
}

/// Compile-time descriptor of one serializable record field.
///
/// Descriptor lists replace runtime reflection: each record shape declares
/// its fields once as a static slice and the codec walks it. A field
/// without both accessors cannot be described, which is what enforces the
/// reader-and-writer eligibility rule.
///
/// `set` reports whether the value was applied; a mismatched wire type is
/// left unapplied and the field keeps its current content.
pub struct FieldSpec<E> {
	/// Attribute name on the wire.
	pub name: &'static str,
	/// Declared type-table tag, for diagnostics.
	pub ty: FieldType,
	/// Excluded from serialization and deserialization when set.
	pub ignore: bool,
	pub get: fn(&E) -> Value,
	pub set: fn(&mut E, &Value) -> bool,
}

impl<E> Debug for FieldSpec<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldSpec")
			.field("name", &self.name)
			.field("ty", &self.ty)
			.field("ignore", &self.ignore)
			.finish_non_exhaustive()
	}
}

/// Build the static field descriptor slice of a record shape.
///
/// Every entry maps a wire attribute name to a struct field and its type
/// tag; append `ignore` to keep a field out of serialization entirely.
/// Field types must implement [`FieldValue`](crate::FieldValue); use
/// `Option<T>` for fields that can be absent or typed-null on the wire.
///
/// ```
/// use polytable_core::{EntityCore, FieldSpec, TableEntity, entity_fields};
///
/// #[derive(Default)]
/// struct Person {
/// 	core: EntityCore,
/// 	name: Option<String>,
/// 	age: Option<i64>,
/// 	secret: Option<String>,
/// }
///
/// impl TableEntity for Person {
/// 	fn new(partition_key: String, row_key: String) -> Self {
/// 		Self { core: EntityCore::new(partition_key, row_key), ..Self::default() }
/// 	}
///
/// 	fn core(&self) -> &EntityCore {
/// 		&self.core
/// 	}
///
/// 	fn core_mut(&mut self) -> &mut EntityCore {
/// 		&mut self.core
/// 	}
///
/// 	fn fields() -> &'static [FieldSpec<Self>] {
/// 		entity_fields!(Person {
/// 			"Name" => name: Utf8,
/// 			"Age" => age: Int8,
/// 			"Secret" => secret: Utf8 ignore,
/// 		})
/// 	}
/// }
/// ```
#[macro_export]
macro_rules! entity_fields {
	(@ignore) => {
		false
	};
	(@ignore ignore) => {
		true
	};
	($entity:ty { $( $name:literal => $field:ident: $ty:ident $($flag:ident)? ),* $(,)? }) => {{
		static FIELDS: &[$crate::FieldSpec<$entity>] = &[
			$(
				$crate::FieldSpec {
					name: $name,
					ty: $crate::FieldType::$ty,
					ignore: $crate::entity_fields!(@ignore $($flag)?),
					get: |entity: &$entity| $crate::FieldValue::to_value(&entity.$field),
					set: |entity: &mut $entity, value: &$crate::Value| {
						match $crate::FieldValue::from_value(value) {
							Some(parsed) => {
								entity.$field = parsed;
								true
							}
							None => false,
						}
					},
				}
			),*
		];
		FIELDS
	}};
}
