use anyhow::Result;
use std::{fmt, rc::Rc};

use crate::host::{Loader, ModuleHost};

/// Lazy getter for one declared dependency. Every `get` goes back to the loader.
pub struct Accessor<H: ModuleHost> {
    dependency: String,
    loader: Rc<Loader<H>>,
}

impl<H: ModuleHost> Accessor<H> {
    pub fn new(dependency: impl Into<String>, loader: Rc<Loader<H>>) -> Self {
        Self {
            dependency: dependency.into(),
            loader,
        }
    }

    /// The declared name this accessor loads (never the alias).
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn get(&self) -> Result<H::Module> {
        self.loader.request(&self.dependency)
    }
}

impl<H: ModuleHost> Clone for Accessor<H> {
    fn clone(&self) -> Self {
        Self {
            dependency: self.dependency.clone(),
            loader: Rc::clone(&self.loader),
        }
    }
}

impl<H: ModuleHost> fmt::Debug for Accessor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor({})", self.dependency)
    }
}

/// Identifier -> accessor, in first-insertion order. Re-inserting a key
/// replaces its accessor in place.
pub struct Namespace<H: ModuleHost> {
    entries: Vec<(String, Accessor<H>)>,
}

impl<H: ModuleHost> Default for Namespace<H> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H: ModuleHost> Namespace<H> {
    pub fn insert(&mut self, ident: &str, accessor: Accessor<H>) {
        match self.entries.iter_mut().find(|(k, _)| k == ident) {
            Some(slot) => slot.1 = accessor,
            None => self.entries.push((ident.to_string(), accessor)),
        }
    }

    pub fn get(&self, ident: &str) -> Option<&Accessor<H>> {
        self.entries
            .iter()
            .find(|(k, _)| k == ident)
            .map(|(_, a)| a)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Accessor<H>)> {
        self.entries.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One declared name and where it ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMapping {
    pub original: String,
    pub group: Option<String>,
    pub identifier: String,
}

impl AliasMapping {
    /// `group.identifier`, or just the identifier at top level.
    pub fn path(&self) -> String {
        match &self.group {
            Some(g) => format!("{g}.{}", self.identifier),
            None => self.identifier.clone(),
        }
    }
}

/// The lookup object handed back to the caller. Top-level identifiers and
/// vendor groups are separate namespaces.
pub struct ResolvedTable<H: ModuleHost> {
    top: Namespace<H>,
    groups: Vec<(String, Namespace<H>)>,
    mappings: Vec<AliasMapping>,
}

impl<H: ModuleHost> Default for ResolvedTable<H> {
    fn default() -> Self {
        Self {
            top: Namespace::default(),
            groups: Vec::new(),
            mappings: Vec::new(),
        }
    }
}

impl<H: ModuleHost> ResolvedTable<H> {
    pub(crate) fn place(&mut self, mapping: AliasMapping, accessor: Accessor<H>) {
        match &mapping.group {
            Some(group) => self.group_mut(group).insert(&mapping.identifier, accessor),
            None => self.top.insert(&mapping.identifier, accessor),
        }
        self.mappings.push(mapping);
    }

    fn group_mut(&mut self, name: &str) -> &mut Namespace<H> {
        let idx = match self.groups.iter().position(|(g, _)| g == name) {
            Some(idx) => idx,
            None => {
                self.groups.push((name.to_string(), Namespace::default()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx].1
    }

    pub fn get(&self, ident: &str) -> Option<&Accessor<H>> {
        self.top.get(ident)
    }

    pub fn group(&self, name: &str) -> Option<&Namespace<H>> {
        self.groups.iter().find(|(g, _)| g == name).map(|(_, ns)| ns)
    }

    /// `ident` at top level first, then `group.ident`.
    pub fn lookup(&self, path: &str) -> Option<&Accessor<H>> {
        if let Some(a) = self.top.get(path) {
            return Some(a);
        }
        let (group, ident) = path.split_once('.')?;
        self.group(group)?.get(ident)
    }

    pub fn top(&self) -> &Namespace<H> {
        &self.top
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &Namespace<H>)> {
        self.groups.iter().map(|(g, ns)| (g.as_str(), ns))
    }

    /// Every placement made while building, in declaration order.
    pub fn mappings(&self) -> &[AliasMapping] {
        &self.mappings
    }

    /// Flattened keys: groups as `group.ident`, then top-level identifiers.
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (g, ns) in &self.groups {
            out.extend(ns.keys().map(|k| format!("{g}.{k}")));
        }
        out.extend(self.top.keys().map(String::from));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.groups.is_empty()
    }
}

impl<H: ModuleHost> fmt::Debug for ResolvedTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTable")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{default_exceptions, NodeModulesHost};

    fn loader() -> Rc<Loader<NodeModulesHost>> {
        Rc::new(Loader::new(
            NodeModulesHost::new("."),
            None,
            default_exceptions(),
            ".",
        ))
    }

    fn mapping(original: &str, group: Option<&str>, ident: &str) -> AliasMapping {
        AliasMapping {
            original: original.to_string(),
            group: group.map(String::from),
            identifier: ident.to_string(),
        }
    }

    #[test]
    fn collision_is_last_write_wins_in_place() {
        let l = loader();
        let mut table = ResolvedTable::default();
        table.place(mapping("a-x", None, "x"), Accessor::new("a-x", Rc::clone(&l)));
        table.place(mapping("y", None, "y"), Accessor::new("y", Rc::clone(&l)));
        table.place(mapping("b-x", None, "x"), Accessor::new("b-x", Rc::clone(&l)));

        assert_eq!(table.keys(), vec!["x", "y"]);
        assert_eq!(table.get("x").unwrap().dependency(), "b-x");
        assert_eq!(table.mappings().len(), 3);
    }

    #[test]
    fn groups_and_top_are_separate_namespaces() {
        let l = loader();
        let mut table = ResolvedTable::default();
        table.place(mapping("postcss", None, "postcss"), Accessor::new("postcss", Rc::clone(&l)));
        table.place(
            mapping("postcss-import", Some("postcss"), "import"),
            Accessor::new("postcss-import", Rc::clone(&l)),
        );

        assert_eq!(table.lookup("postcss").unwrap().dependency(), "postcss");
        assert_eq!(table.lookup("postcss.import").unwrap().dependency(), "postcss-import");
        assert!(table.lookup("rollup.x").is_none());
        assert_eq!(table.keys(), vec!["postcss.import", "postcss"]);
    }

    #[test]
    fn accessor_is_lazy() {
        let l = loader();
        let mut table = ResolvedTable::default();
        // nothing loads at placement time, so an uninstalled package is fine here
        table.place(
            mapping("definitely-not-installed", None, "nope"),
            Accessor::new("definitely-not-installed", Rc::clone(&l)),
        );
        assert!(table.get("nope").unwrap().get().is_err());
    }
}
