// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use chrono::{DateTime, Utc};

use crate::field::FieldSpec;

/// Attribute name the partition key occupies on the wire.
pub const PARTITION_KEY: &str = "PartitionKey";
/// Attribute name the row key occupies on the wire.
pub const ROW_KEY: &str = "RowKey";
/// Attribute name of the concurrency token where it travels as data.
pub const ETAG: &str = "ETag";
/// Attribute name of the last-modified timestamp where it travels as data.
pub const TIMESTAMP: &str = "Timestamp";

/// Wildcard concurrency token: matches any stored version, disabling the
/// optimistic-concurrency check for that write.
pub const ETAG_ANY: &str = "*";

/// The four system fields every stored record carries.
///
/// `partition_key` and `row_key` form the identity of the record inside one
/// table and must be non-empty before a write. The token and timestamp are
/// store-owned: successful writes update them in place on the record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityCore {
	pub partition_key: String,
	pub row_key: String,
	pub etag: Option<String>,
	pub timestamp: Option<DateTime<Utc>>,
}

impl EntityCore {
	pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
		Self {
			partition_key: partition_key.into(),
			row_key: row_key.into(),
			etag: None,
			timestamp: None,
		}
	}

	/// Force the wildcard token unless the caller already supplied one.
	///
	/// Insert, update and delete call this before dispatch: the default
	/// write behavior is last-write-wins, and only a caller that pre-set a
	/// real token gets the optimistic-concurrency check.
	pub fn ensure_etag(&mut self) {
		if self.etag.is_none() {
			self.etag = Some(ETAG_ANY.to_string());
		}
	}
}

/// A typed record stored under a two-part key.
///
/// Implementations embed an [`EntityCore`] for the system fields and expose
/// a static [`FieldSpec`] slice for everything else, typically via the
/// [`entity_fields!`](crate::entity_fields) macro. `new` is the required
/// two-argument factory the codec uses to materialize instances from raw
/// store data.
pub trait TableEntity: Send + Sized + 'static {
	fn new(partition_key: String, row_key: String) -> Self;

	fn core(&self) -> &EntityCore;

	fn core_mut(&mut self) -> &mut EntityCore;

	fn fields() -> &'static [FieldSpec<Self>];

	fn partition_key(&self) -> &str {
		&self.core().partition_key
	}

	fn row_key(&self) -> &str {
		&self.core().row_key
	}

	fn etag(&self) -> Option<&str> {
		self.core().etag.as_deref()
	}

	fn timestamp(&self) -> Option<DateTime<Utc>> {
		self.core().timestamp
	}
}
