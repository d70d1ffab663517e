use std::rc::Rc;

use crate::{
    config::{AliasMap, Options},
    context::ProjectEnv,
    host::{Loader, ModuleHost},
    manifest::PackageManifest,
    naming, report,
    table::{Accessor, AliasMapping, ResolvedTable},
};

/// Builds a [`ResolvedTable`] from a manifest's declared dev dependencies.
pub struct AliasResolver<M> {
    options: Options<M>,
}

impl<M> AliasResolver<M> {
    pub fn new(options: Options<M>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options<M> {
        &self.options
    }

    /// Override map for one build: explicit options win over the manifest's
    /// `aliases`, then the defaults fill whatever is missing.
    pub fn effective_aliases(&self, manifest: &PackageManifest) -> AliasMap {
        let mut aliases = self
            .options
            .aliases
            .clone()
            .or_else(|| manifest.aliases.clone())
            .unwrap_or_default();
        self.options.defaults.apply_aliases(&mut aliases);
        aliases
    }

    /// Naming pipeline for a single declared name.
    pub fn derive(&self, original: &str, aliases: &AliasMap) -> AliasMapping {
        let aliased = aliases
            .get(original)
            .map(String::as_str)
            .unwrap_or(original);

        let group = if self.options.scope {
            naming::detect_vendor(aliased, &self.options.vendor_rules)
        } else {
            None
        };

        let segment = naming::last_segment(aliased);
        let stripped = naming::strip_prefixes(segment, &self.options.name_truncators);

        // A keyword can't be an identifier: keep the declared name verbatim.
        let identifier = if naming::is_reserved(&stripped) {
            original.to_string()
        } else {
            naming::camel_case(&stripped)
        };

        AliasMapping {
            original: original.to_string(),
            group,
            identifier,
        }
    }

    pub fn build<H>(mut self, manifest: &PackageManifest, host: H, env: &ProjectEnv) -> ResolvedTable<H>
    where
        H: ModuleHost<Module = M>,
    {
        let mut table = ResolvedTable::default();

        let mut deps = manifest.declared();
        if deps.is_empty() {
            if self.options.log {
                log::warn!("{}", report::NO_PACKAGES);
            }
            return table;
        }

        let aliases = self.effective_aliases(manifest);
        self.options.defaults.apply_declared(&mut deps);

        let loader = Rc::new(Loader::new(
            host,
            self.options.module_handler.take(),
            std::mem::take(&mut self.options.exceptions),
            env.root(),
        ));

        for name in deps.names() {
            let mapping = self.derive(name, &aliases);
            log::debug!("{name} => {}", mapping.path());
            table.place(mapping, Accessor::new(name, Rc::clone(&loader)));
        }

        if self.options.log && env.is_dev() {
            report::emit(&table);
        }

        table
    }
}

/// One-shot convenience over [`AliasResolver`].
pub fn resolve<H: ModuleHost>(
    manifest: &PackageManifest,
    host: H,
    options: Options<H::Module>,
    env: &ProjectEnv,
) -> ResolvedTable<H> {
    AliasResolver::new(options).build(manifest, host, env)
}
