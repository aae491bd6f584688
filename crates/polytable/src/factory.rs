// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	collections::HashMap,
	panic::{AssertUnwindSafe, catch_unwind},
};

use once_cell::sync::Lazy;
use polytable_core::{Error, ProviderOptions, Result, TableOptions};
use polytable_datastore::DatastoreClient;
use polytable_tablestore::TableStoreClient;

use crate::client::Client;

type ProviderConstructor = fn(&HashMap<String, String>, TableOptions) -> Result<Client>;

/// Static registration table: provider name → adapter constructor.
///
/// Populated once at first use; adding a provider means adding a line
/// here, there is no runtime discovery.
static REGISTRY: Lazy<HashMap<&'static str, ProviderConstructor>> = Lazy::new(|| {
	let mut providers: HashMap<&'static str, ProviderConstructor> = HashMap::new();
	providers.insert(polytable_tablestore::PROVIDER, |options, settings| {
		Ok(Client::TableStore(TableStoreClient::connect(options, settings)?))
	});
	providers.insert(polytable_datastore::PROVIDER, |options, settings| {
		Ok(Client::Datastore(DatastoreClient::connect(options, settings)?))
	});
	providers
});

/// Names of every registered provider, sorted.
pub fn providers() -> Vec<&'static str> {
	let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
	names.sort_unstable();
	names
}

/// Builds [`Client`]s from provider configuration.
///
/// Construction is the only place configuration is validated: an unknown
/// provider name, an absent option map or a missing provider-required key
/// all fail here, synchronously, and never at operation time.
pub struct ClientFactory {
	settings: TableOptions,
}

impl ClientFactory {
	pub fn new() -> Self {
		Self {
			settings: TableOptions::default(),
		}
	}

	/// Apply a caller callback to the shared settings, best effort.
	///
	/// A panicking callback is swallowed: partial changes are discarded,
	/// defaults apply, and nothing surfaces to the caller. This mirrors
	/// how host configuration hooks are treated: a broken hook must not
	/// take the storage layer down with it.
	pub fn configure(configure: impl FnOnce(&mut TableOptions)) -> Self {
		let settings = catch_unwind(AssertUnwindSafe(|| {
			let mut scratch = TableOptions::default();
			configure(&mut scratch);
			scratch
		}))
		.unwrap_or_default();

		Self { settings }
	}

	pub fn create(&self, options: &ProviderOptions) -> Result<Client> {
		let constructor = REGISTRY.get(options.provider.as_str()).ok_or_else(|| Error::UnknownProvider {
			name: options.provider.clone(),
		})?;

		let map = options.options.as_ref().ok_or(Error::MissingOptions)?;

		constructor(map, self.settings)
	}
}

impl Default for ClientFactory {
	fn default() -> Self {
		Self::new()
	}
}
