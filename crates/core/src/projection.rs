// Copyright (c) polytable.dev 2025
// This file is licensed under the MIT, see license.md file

use serde::{Deserialize, Serialize};

/// Ordered set of attribute names restricting which non-key fields a read
/// or write touches.
///
/// An empty projection means "all eligible fields", same as passing no
/// projection at all; both forms occur in the wild and are treated alike.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection(Vec<String>);

impl Projection {
	pub fn new<I, S>(columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(columns.into_iter().map(Into::into).collect())
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.iter().any(|column| column == name)
	}

	pub fn columns(&self) -> &[String] {
		&self.0
	}

	/// True when this projection lets the named attribute through.
	pub fn allows(&self, name: &str) -> bool {
		self.is_empty() || self.contains(name)
	}
}

impl<S: Into<String>> FromIterator<S> for Projection {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}
