// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::field::FieldType;

/// Indexed attributes are capped by the document store at 1500 bytes;
/// anything larger is stored but excluded from secondary indexes.
pub const MAX_INDEXED_VALUE_SIZE: usize = 1500;

/// A table attribute value, one variant per supported wire type.
///
/// The set is fixed: both backing stores agree on these primitives and the
/// codec maps record fields through them in either direction. Anything a
/// store returns outside this table never reaches a record field.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// A typed null: the attribute exists but carries no value.
	Null,
	/// A UTF-8 encoded text value.
	Utf8(String),
	/// An opaque byte sequence.
	Blob(Vec<u8>),
	/// A boolean: true or false.
	Boolean(bool),
	/// A date and time without offset, read as UTC.
	DateTime(NaiveDateTime),
	/// A date and time carrying an offset, normalized to UTC.
	DateTimeOffset(DateTime<Utc>),
	/// An 8-byte floating point.
	Float8(f64),
	/// A 4-byte signed integer.
	Int4(i32),
	/// An 8-byte signed integer.
	Int8(i64),
	/// A UUID, carried as a string by stores without a native variant.
	Uuid(Uuid),
}

impl Value {
	pub const fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// The type-table tag of this value, or `None` for a typed null.
	pub const fn ty(&self) -> Option<FieldType> {
		match self {
			Self::Null => None,
			Self::Utf8(_) => Some(FieldType::Utf8),
			Self::Blob(_) => Some(FieldType::Blob),
			Self::Boolean(_) => Some(FieldType::Boolean),
			Self::DateTime(_) => Some(FieldType::DateTime),
			Self::DateTimeOffset(_) => Some(FieldType::DateTimeOffset),
			Self::Float8(_) => Some(FieldType::Float8),
			Self::Int4(_) => Some(FieldType::Int4),
			Self::Int8(_) => Some(FieldType::Int8),
			Self::Uuid(_) => Some(FieldType::Uuid),
		}
	}

	pub fn as_utf8(&self) -> Option<&str> {
		if let Self::Utf8(s) = self { Some(s.as_str()) } else { None }
	}

	/// Size of this value as counted against the indexed-attribute ceiling.
	///
	/// Text is sized in UTF-16 code units times two, matching how the
	/// document store counts it. Only text and blobs are size-capped.
	pub fn indexed_size(&self) -> Option<usize> {
		match self {
			Self::Utf8(s) => Some(s.encode_utf16().count() * 2),
			Self::Blob(b) => Some(b.len()),
			_ => None,
		}
	}

	pub fn exceeds_index_limit(&self) -> bool {
		self.indexed_size().is_some_and(|size| size > MAX_INDEXED_VALUE_SIZE)
	}
}

macro_rules! impl_value_from {
	( $( $type:ty => $variant:ident ),* $(,)? ) => {
		$(
			impl From<$type> for Value {
				fn from(v: $type) -> Self {
					Self::$variant(v.into())
				}
			}
		)*
	};
}

impl_value_from! {
	String => Utf8,
	&str => Utf8,
	Vec<u8> => Blob,
	bool => Boolean,
	NaiveDateTime => DateTime,
	DateTime<Utc> => DateTimeOffset,
	f64 => Float8,
	i32 => Int4,
	i64 => Int8,
	Uuid => Uuid,
}

/// Conversion between a record field's Rust type and the value table.
///
/// `from_value` is deliberately permissive: a mismatched variant yields
/// `None` and the caller leaves the field untouched. The only coercions are
/// the ones the stores themselves force on us: integers narrow back from
/// the 8-byte wire form, UUIDs parse out of strings, and timestamps cross
/// between the offset and offset-less flavors.
pub trait FieldValue: Sized {
	fn to_value(&self) -> Value;

	fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
	fn to_value(&self) -> Value {
		Value::Utf8(self.clone())
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Utf8(s) => Some(s.clone()),
			_ => None,
		}
	}
}

impl FieldValue for Vec<u8> {
	fn to_value(&self) -> Value {
		Value::Blob(self.clone())
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Blob(b) => Some(b.clone()),
			_ => None,
		}
	}
}

impl FieldValue for bool {
	fn to_value(&self) -> Value {
		Value::Boolean(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Boolean(b) => Some(*b),
			_ => None,
		}
	}
}

impl FieldValue for NaiveDateTime {
	fn to_value(&self) -> Value {
		Value::DateTime(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::DateTime(v) => Some(*v),
			Value::DateTimeOffset(v) => Some(v.naive_utc()),
			_ => None,
		}
	}
}

impl FieldValue for DateTime<Utc> {
	fn to_value(&self) -> Value {
		Value::DateTimeOffset(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::DateTimeOffset(v) => Some(*v),
			Value::DateTime(v) => Some(Utc.from_utc_datetime(v)),
			_ => None,
		}
	}
}

impl FieldValue for f64 {
	fn to_value(&self) -> Value {
		Value::Float8(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Float8(v) => Some(*v),
			_ => None,
		}
	}
}

impl FieldValue for i32 {
	fn to_value(&self) -> Value {
		Value::Int4(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Int4(v) => Some(*v),
			// The document store widens every integer to 8 bytes on the
			// wire; narrow back, out-of-range stays untouched.
			Value::Int8(v) => i32::try_from(*v).ok(),
			_ => None,
		}
	}
}

impl FieldValue for i64 {
	fn to_value(&self) -> Value {
		Value::Int8(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Int8(v) => Some(*v),
			Value::Int4(v) => Some(i64::from(*v)),
			_ => None,
		}
	}
}

impl FieldValue for Uuid {
	fn to_value(&self) -> Value {
		Value::Uuid(*self)
	}

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Uuid(v) => Some(*v),
			Value::Utf8(s) => Uuid::parse_str(s).ok(),
			_ => None,
		}
	}
}

impl<T: FieldValue> FieldValue for Option<T> {
	fn to_value(&self) -> Value {
		match self {
			Some(v) => v.to_value(),
			None => Value::Null,
		}
	}

	fn from_value(value: &Value) -> Option<Self> {
		if value.is_null() {
			// A typed null clears the field.
			Some(None)
		} else {
			T::from_value(value).map(Some)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_indexed_size_counts_utf16_units() {
		let ascii = Value::Utf8("a".repeat(750));
		assert_eq!(ascii.indexed_size(), Some(1500));
		assert!(!ascii.exceeds_index_limit());

		let over = Value::Utf8("a".repeat(751));
		assert_eq!(over.indexed_size(), Some(1502));
		assert!(over.exceeds_index_limit());

		// Non-BMP characters take two UTF-16 units.
		let emoji = Value::Utf8("🦀".repeat(376));
		assert_eq!(emoji.indexed_size(), Some(1504));
		assert!(emoji.exceeds_index_limit());
	}

	#[test]
	fn test_indexed_size_blob_is_raw_length() {
		assert!(!Value::Blob(vec![0u8; 1500]).exceeds_index_limit());
		assert!(Value::Blob(vec![0u8; 1501]).exceeds_index_limit());
		assert_eq!(Value::Boolean(true).indexed_size(), None);
	}

	#[test]
	fn test_integer_narrowing() {
		assert_eq!(i32::from_value(&Value::Int8(42)), Some(42));
		assert_eq!(i32::from_value(&Value::Int8(i64::from(i32::MAX) + 1)), None);
		assert_eq!(i64::from_value(&Value::Int4(7)), Some(7));
	}

	#[test]
	fn test_uuid_from_string() {
		let id = Uuid::new_v4();
		assert_eq!(Uuid::from_value(&Value::Utf8(id.to_string())), Some(id));
		assert_eq!(Uuid::from_value(&Value::Utf8("not-a-uuid".into())), None);
	}

	#[test]
	fn test_timestamp_flavors_cross_convert() {
		let utc = Utc::now();
		assert_eq!(NaiveDateTime::from_value(&Value::DateTimeOffset(utc)), Some(utc.naive_utc()));
		let naive = utc.naive_utc();
		assert_eq!(<DateTime<Utc>>::from_value(&Value::DateTime(naive)), Some(utc));
	}

	#[test]
	fn test_option_null_round_trip() {
		let absent: Option<String> = None;
		assert_eq!(absent.to_value(), Value::Null);
		assert_eq!(<Option<String>>::from_value(&Value::Null), Some(None));
		assert_eq!(<Option<String>>::from_value(&Value::Boolean(true)), None);
	}
}
