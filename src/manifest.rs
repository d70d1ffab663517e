// Project descriptor - package.json

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::config::AliasMap;

pub const MANIFEST_FILE: &str = "package.json";

/// The fields of package.json this tool reads. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    /// Key order is the file's order.
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: Map<String, Value>,

    #[serde(default)]
    pub aliases: Option<AliasMap>,
}

impl PackageManifest {
    pub fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse package.json")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load(dir.as_ref().join(MANIFEST_FILE))
    }

    pub fn declared(&self) -> DeclaredDeps {
        DeclaredDeps {
            entries: self
                .dev_dependencies
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Declared dependency names with their (ignored) metadata, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredDeps {
    entries: Vec<(String, Value)>,
}

impl DeclaredDeps {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Appends `name` with empty metadata unless already declared.
    pub fn insert_missing(&mut self, name: &str) {
        if !self.contains(name) {
            self.entries
                .push((name.to_string(), Value::String(String::new())));
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| k != name);
    }
}

impl<'a> FromIterator<&'a str> for DeclaredDeps {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut deps = DeclaredDeps::default();
        for name in iter {
            deps.insert_missing(name);
        }
        deps
    }
}
