// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration selecting and parameterizing one backing provider.
///
/// `provider` names a registered adapter; `options` carries that adapter's
/// string-keyed settings (connection string, project identifier, ...).
/// Recognized keys are provider-specific and validated only at client
/// construction; unrecognized keys are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderOptions {
	pub provider: String,
	pub options: Option<HashMap<String, String>>,
}

impl ProviderOptions {
	pub fn new(provider: impl Into<String>) -> Self {
		Self {
			provider: provider.into(),
			options: None,
		}
	}

	pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.options.get_or_insert_with(HashMap::new).insert(key.into(), value.into());
		self
	}
}

/// Look up a provider-required option key, failing construction if absent.
pub fn require_option<'a>(options: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str> {
	options.get(key).map(String::as_str).ok_or(Error::MissingOptionKey { key })
}

/// Settings shared by every constructed client, independent of provider.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TableOptions {
	/// Emit diagnostic logging for codec gaps (skipped fields, type
	/// mismatches). Off by default; the gaps themselves stay silent either
	/// way.
	pub enable_logging: bool,
}
