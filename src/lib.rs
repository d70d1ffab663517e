pub mod config;
pub mod context;
pub mod host;
pub mod manifest;
pub mod naming;
pub mod report;
pub mod resolve;
pub mod table;

// Convenience re-exports
pub use config::{AliasMap, ModuleHandler, Options, Settings, VendorRule};
pub use context::ProjectEnv;
pub use host::{Adapter, Loader, ModuleHost, ModuleRef, NodeModulesHost};
pub use manifest::{DeclaredDeps, PackageManifest};
pub use resolve::{resolve, AliasResolver};
pub use table::{Accessor, AliasMapping, Namespace, ResolvedTable};
