// src/config/aliases.rs
use std::collections::BTreeMap;

use crate::manifest::DeclaredDeps;

pub type AliasMap = BTreeMap<String, String>;

/// The logging dependency every project can reach as `log`.
pub const LOGGER_DEPENDENCY: &str = "@marknotton/lumberjack";

/// This tool's own package; never exported from the table.
pub const SELF_DEPENDENCY: &str = "@marknotton/dependencies";

/// Names and aliases injected before the pipeline runs.
#[derive(Debug, Clone)]
pub struct Defaults {
	/// Aliases applied when the override map doesn't already name the dependency.
	pub aliases: AliasMap,

	/// Dependencies added (with empty metadata) when not declared.
	pub always_declared: Vec<String>,

	/// Removed from the declared set if present.
	pub excluded: Vec<String>,
}

impl Default for Defaults {
	fn default() -> Self {
		let mut aliases = AliasMap::new();
		aliases.insert("path".to_string(), "Path".to_string());
		aliases.insert("stream".to_string(), "Stream".to_string());
		aliases.insert(LOGGER_DEPENDENCY.to_string(), "log".to_string());

		Self {
			aliases,
			always_declared: ["path", "stream", "fs", LOGGER_DEPENDENCY]
				.into_iter()
				.map(String::from)
				.collect(),
			excluded: vec![SELF_DEPENDENCY.to_string()],
		}
	}
}

impl Defaults {
	/// Fill-missing merge of the default aliases into `aliases`.
	pub fn apply_aliases(&self, aliases: &mut AliasMap) {
		for (name, alias) in &self.aliases {
			aliases
				.entry(name.clone())
				.or_insert_with(|| alias.clone());
		}
	}

	/// Drop excluded names, then append the always-declared ones that are missing.
	pub fn apply_declared(&self, deps: &mut DeclaredDeps) {
		for name in &self.excluded {
			deps.remove(name);
		}
		for name in &self.always_declared {
			deps.insert_missing(name);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_aliases_win_over_defaults() {
		let mut aliases = AliasMap::new();
		aliases.insert("path".to_string(), "nodePath".to_string());

		Defaults::default().apply_aliases(&mut aliases);

		assert_eq!(aliases["path"], "nodePath");
		assert_eq!(aliases["stream"], "Stream");
		assert_eq!(aliases[LOGGER_DEPENDENCY], "log");
	}

	#[test]
	fn declared_defaults_append_in_order_and_drop_self() {
		let mut deps: DeclaredDeps = ["gulp", SELF_DEPENDENCY, "fs"].into_iter().collect();

		Defaults::default().apply_declared(&mut deps);

		let names: Vec<&str> = deps.names().collect();
		assert_eq!(names, vec!["gulp", "fs", "path", "stream", LOGGER_DEPENDENCY]);
	}
}
