// src/config/mod.rs
use std::{collections::BTreeMap, fmt, path::Path};

use anyhow::{Context as _, Result};

pub mod aliases;
pub mod vendors;

pub use aliases::{AliasMap, Defaults, LOGGER_DEPENDENCY, SELF_DEPENDENCY};
pub use vendors::{default_vendor_rules, VendorRule};

use crate::host::{default_exceptions, Adapter, ExceptionTable};

/// Custom resolution callback. Returning `Some` short-circuits the default handling.
pub type ModuleHandler<M> = Box<dyn Fn(&str) -> Option<M>>;

pub fn default_name_truncators() -> Vec<String> {
	["gulp-", "postcss-", "plugin-", "rollup-"]
		.into_iter()
		.map(String::from)
		.collect()
}

/// Per-call resolver configuration. Nothing here outlives the call it's passed to.
pub struct Options<M> {
	/// Emit the alias report (only in a development context).
	pub log: bool,

	/// Nest vendor-matched identifiers under their group.
	pub scope: bool,

	pub module_handler: Option<ModuleHandler<M>>,

	/// Substrings removed from each identifier, every occurrence.
	pub name_truncators: Vec<String>,

	/// Replaces the manifest's `aliases` field when set.
	pub aliases: Option<AliasMap>,

	pub vendor_rules: Vec<VendorRule>,

	pub exceptions: ExceptionTable,

	pub defaults: Defaults,
}

impl<M> Default for Options<M> {
	fn default() -> Self {
		Self {
			log: true,
			scope: true,
			module_handler: None,
			name_truncators: default_name_truncators(),
			aliases: None,
			vendor_rules: default_vendor_rules(),
			exceptions: default_exceptions(),
			defaults: Defaults::default(),
		}
	}
}

impl<M> fmt::Debug for Options<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("log", &self.log)
			.field("scope", &self.scope)
			.field("module_handler", &self.module_handler.is_some())
			.field("name_truncators", &self.name_truncators)
			.field("aliases", &self.aliases)
			.field("vendor_rules", &self.vendor_rules)
			.field("exceptions", &self.exceptions)
			.finish()
	}
}

impl<M> Options<M> {
	pub fn with_handler<F>(mut self, handler: F) -> Self
	where
		F: Fn(&str) -> Option<M> + 'static,
	{
		self.module_handler = Some(Box::new(handler));
		self
	}

	pub fn with_aliases(mut self, aliases: AliasMap) -> Self {
		self.aliases = Some(aliases);
		self
	}
}

/// `depalias.toml`. Every field is optional; absent fields keep the built-in defaults.
#[derive(Debug, Default, serde::Deserialize)]
pub struct Settings {
	#[serde(default)]
	pub log: Option<bool>,

	#[serde(default)]
	pub scope: Option<bool>,

	#[serde(default)]
	pub name_truncators: Option<Vec<String>>,

	#[serde(default)]
	pub aliases: Option<AliasMap>,

	/// Replaces the default rule list entirely.
	#[serde(default)]
	pub vendor_rules: Option<Vec<VendorRule>>,

	/// Merged over the default exception table.
	#[serde(default)]
	pub exceptions: BTreeMap<String, Adapter>,
}

impl Settings {
	pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read settings at {}", path.display()))?;
		Self::from_toml(&text).with_context(|| format!("invalid settings in {}", path.display()))
	}

	pub fn from_toml(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}

	pub fn apply<M>(self, options: &mut Options<M>) {
		if let Some(log) = self.log {
			options.log = log;
		}
		if let Some(scope) = self.scope {
			options.scope = scope;
		}
		if let Some(truncators) = self.name_truncators {
			options.name_truncators = truncators;
		}
		if let Some(aliases) = self.aliases {
			options.aliases = Some(aliases);
		}
		if let Some(rules) = self.vendor_rules {
			options.vendor_rules = rules;
		}
		options.exceptions.extend(self.exceptions);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_settings_keep_defaults() {
		let mut options: Options<()> = Options::default();
		Settings::from_toml("").unwrap().apply(&mut options);

		assert!(options.log);
		assert!(options.scope);
		assert_eq!(options.name_truncators, default_name_truncators());
		assert_eq!(options.vendor_rules, default_vendor_rules());
		assert!(options.aliases.is_none());
	}

	#[test]
	fn settings_override_fields() {
		let text = r#"
log = false
scope = false
name_truncators = ["grunt-"]

[aliases]
"gulp-sass" = "sass"

[exceptions.chalk]
kind = "export"
key = "default"
"#;
		let mut options: Options<()> = Options::default();
		Settings::from_toml(text).unwrap().apply(&mut options);

		assert!(!options.log);
		assert!(!options.scope);
		assert_eq!(options.name_truncators, vec!["grunt-".to_string()]);
		assert_eq!(options.aliases.as_ref().unwrap()["gulp-sass"], "sass");
		assert_eq!(
			options.exceptions.get("chalk"),
			Some(&Adapter::Export { key: "default".to_string() })
		);
		// defaults survive the merge
		assert!(options.exceptions.contains_key("browser-sync"));
	}

	#[test]
	fn non_string_alias_is_rejected() {
		let err = Settings::from_toml("[aliases]\npath = 3\n").unwrap_err();
		assert!(!err.to_string().is_empty());
	}
}
