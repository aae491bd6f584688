// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use polytable::{ClientFactory, Error, ProviderOptions, providers};

#[test]
fn test_registry_lists_both_providers() {
	assert_eq!(providers(), vec!["datastore", "tablestore"]);
}

#[test]
fn test_unknown_provider_fails_fast() {
	let factory = ClientFactory::new();
	let err = factory.create(&ProviderOptions::new("gopher-store")).unwrap_err();
	assert!(matches!(&err, Error::UnknownProvider { name } if name == "gopher-store"));
	assert!(err.is_configuration());
}

#[test]
fn test_absent_option_map_fails_fast() {
	let factory = ClientFactory::new();
	let err = factory.create(&ProviderOptions::new("tablestore")).unwrap_err();
	assert!(matches!(err, Error::MissingOptions));
	assert!(err.is_configuration());
}

#[test]
fn test_missing_required_key_names_the_key() {
	let factory = ClientFactory::new();

	let err = factory
		.create(&ProviderOptions::new("tablestore").with_option("irrelevant", "x"))
		.unwrap_err();
	assert!(matches!(err, Error::MissingOptionKey { key: "connection_string" }));

	let err = factory
		.create(&ProviderOptions::new("datastore").with_option("irrelevant", "x"))
		.unwrap_err();
	assert!(matches!(err, Error::MissingOptionKey { key: "project_id" }));
}

#[test]
fn test_create_selects_the_configured_provider() {
	let factory = ClientFactory::new();

	let client = factory
		.create(&ProviderOptions::new("tablestore").with_option("connection_string", "endpoint=embedded"))
		.unwrap();
	assert_eq!(client.provider(), "tablestore");

	let client = factory
		.create(&ProviderOptions::new("datastore").with_option("project_id", "demo"))
		.unwrap();
	assert_eq!(client.provider(), "datastore");
}

#[test]
fn test_unrecognized_option_keys_are_ignored() {
	let factory = ClientFactory::new();
	let options = ProviderOptions::new("tablestore")
		.with_option("connection_string", "endpoint=embedded")
		.with_option("future_knob", "on");
	assert!(factory.create(&options).is_ok());
}

#[test]
fn test_configure_applies_settings() {
	let factory = ClientFactory::configure(|settings| {
		settings.enable_logging = true;
	});
	let options = ProviderOptions::new("tablestore").with_option("connection_string", "endpoint=embedded");
	assert!(factory.create(&options).is_ok());
}

// Edge case, deliberate behavior: a panicking configuration callback is
// swallowed and defaults apply. This can mask a genuine caller mistake
// (the panic below never surfaces), which is why it is pinned here.
#[test]
fn test_panicking_configure_callback_falls_back_to_defaults() {
	let factory = ClientFactory::configure(|settings| {
		settings.enable_logging = true;
		panic!("broken configuration hook");
	});

	// The factory still works, on default settings.
	let options = ProviderOptions::new("datastore").with_option("project_id", "demo");
	assert!(factory.create(&options).is_ok());
}
