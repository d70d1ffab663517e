// src/config/vendors.rs
use crate::naming;

/// One vendor-grouping heuristic. Rules are tried in order; the first that
/// applies decides.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VendorRule {
	/// `@scope/name` or `scope/name`: the first segment, minus a leading `@`.
	PathScope,

	/// Any name containing `needle`.
	Contains { needle: String, group: String },

	/// An exact name.
	Equals { name: String, group: String },
}

impl VendorRule {
	pub fn contains(needle: &str, group: &str) -> Self {
		Self::Contains {
			needle: needle.to_string(),
			group: group.to_string(),
		}
	}

	pub fn equals(name: &str, group: &str) -> Self {
		Self::Equals {
			name: name.to_string(),
			group: group.to_string(),
		}
	}

	/// Whether this rule claims `name`. A claimed name stops the search even
	/// when the rule then yields no group.
	pub fn applies(&self, name: &str) -> bool {
		match self {
			Self::PathScope => name.contains('/'),
			Self::Contains { needle, .. } => name.contains(needle.as_str()),
			Self::Equals { name: exact, .. } => name == exact.as_str(),
		}
	}

	/// The group this rule assigns to `name`, if it applies. Never empty.
	pub fn group_for(&self, name: &str) -> Option<String> {
		if !self.applies(name) {
			return None;
		}

		let group = match self {
			Self::PathScope => {
				let first = naming::segments(name).next()?;
				first.strip_prefix('@').unwrap_or(first).to_string()
			}
			Self::Contains { group, .. } | Self::Equals { group, .. } => group.clone(),
		};

		if group.is_empty() { None } else { Some(group) }
	}
}

/// Scope prefix first, then the CSS tooling family, then the bundler plugins.
pub fn default_vendor_rules() -> Vec<VendorRule> {
	vec![
		VendorRule::PathScope,
		VendorRule::contains("postcss-", "postcss"),
		VendorRule::equals("autoprefixer", "postcss"),
		VendorRule::contains("rollup", "rollup"),
	]
}
