// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy of the table layer.
///
/// Configuration errors are only raised while constructing a client, never
/// at operation time. Store faults reported by a backing driver propagate
/// unchanged; the layer adds no retry logic of its own.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// No adapter is registered under the configured provider name.
	#[error("no table provider is registered under name: {name}")]
	UnknownProvider { name: String },

	/// The provider options map itself is absent.
	#[error("provider options map is required")]
	MissingOptions,

	/// A provider-specific required option key is absent.
	#[error("{key} is required")]
	MissingOptionKey { key: &'static str },

	/// The caller requested abandonment of the operation.
	///
	/// Distinct from a failure: work already dispatched to the store is not
	/// retracted, but nothing further is submitted once this is observed.
	#[error("operation was cancelled")]
	Cancelled,

	/// An insert targeted a key that is already occupied.
	#[error("entity already exists: {partition_key}/{row_key}")]
	EntityAlreadyExists { partition_key: String, row_key: String },

	/// An update or delete targeted a key with no stored entity.
	#[error("entity not found: {partition_key}/{row_key}")]
	EntityNotFound { partition_key: String, row_key: String },

	/// A non-wildcard concurrency token did not match the stored one.
	#[error("concurrency token mismatch: {partition_key}/{row_key}")]
	TokenMismatch { partition_key: String, row_key: String },

	/// Opaque fault reported by an external provider SDK driver.
	#[error("{0}")]
	Provider(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
	/// Wrap a driver/SDK fault for unchanged propagation to the caller.
	pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Provider(Box::new(err))
	}

	/// True for errors raised while constructing a client from options.
	pub const fn is_configuration(&self) -> bool {
		matches!(self, Self::UnknownProvider { .. } | Self::MissingOptions | Self::MissingOptionKey { .. })
	}

	pub const fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}
