use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::config::ModuleHandler;

/// The host's "load module by name" capability, plus the two operations the
/// exception table needs on a loaded module.
pub trait ModuleHost {
    type Module: Clone;

    fn load(&self, name: &str) -> Result<Self::Module>;

    /// A named export of `module`, if it has one.
    fn export(&self, module: &Self::Module, key: &str) -> Option<Self::Module>;

    /// Invoke `module` itself (`method = None`) or one of its methods.
    fn call(&self, module: &Self::Module, method: Option<&str>, args: &[Value]) -> Result<Self::Module>;
}

/// How a loaded module is turned into the value exposed behind its identifier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adapter {
    /// A named export instead of the module.
    Export { key: String },

    /// A named export when present, the module otherwise.
    ExportOr { key: String },

    /// The result of calling a zero-argument method (a factory or builder).
    CallMethod { method: String },

    /// Invoke the module with `{ option: [value] }`, `value` read from a
    /// project-local JSON file at `pointer`.
    InvokeWithSetting {
        file: String,
        pointer: String,
        option: String,
    },
}

pub type ExceptionTable = BTreeMap<String, Adapter>;

pub fn default_exceptions() -> ExceptionTable {
    let export = |key: &str| Adapter::Export { key: key.to_string() };
    let call = |method: &str| Adapter::CallMethod { method: method.to_string() };

    let mut t = ExceptionTable::new();
    t.insert("browser-sync".to_string(), call("create"));
    t.insert("gulp-run-command".to_string(), export("default"));
    t.insert("rollup".to_string(), export("rollup"));
    t.insert("rollup-plugin-terser".to_string(), export("terser"));
    t.insert("@rollup/plugin-node-resolve".to_string(), export("nodeResolve"));
    t.insert("dotenv".to_string(), call("config"));
    t.insert(
        "minimatch".to_string(),
        Adapter::ExportOr { key: "Minimatch".to_string() },
    );
    t.insert(
        "postcss-assets".to_string(),
        Adapter::InvokeWithSetting {
            file: "config.json".to_string(),
            pointer: "/paths/images".to_string(),
            option: "loadPaths".to_string(),
        },
    );
    t
}

/// Shared by every accessor of one table: the host, the optional custom
/// handler and the exception table.
pub struct Loader<H: ModuleHost> {
    host: H,
    handler: Option<ModuleHandler<H::Module>>,
    exceptions: ExceptionTable,
    project_dir: PathBuf,
}

impl<H: ModuleHost> Loader<H> {
    pub fn new(
        host: H,
        handler: Option<ModuleHandler<H::Module>>,
        exceptions: ExceptionTable,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host,
            handler,
            exceptions,
            project_dir: project_dir.into(),
        }
    }

    /// Value for the declared dependency `name`. Runs on every access.
    pub fn request(&self, name: &str) -> Result<H::Module> {
        if let Some(handler) = &self.handler {
            if let Some(value) = handler(name) {
                return Ok(value);
            }
        }

        let module = self
            .host
            .load(name)
            .with_context(|| format!("failed to load dependency '{name}'"))?;

        match self.exceptions.get(name) {
            None => Ok(module),
            Some(adapter) => self
                .adapt(module, adapter)
                .with_context(|| format!("failed to adapt dependency '{name}'")),
        }
    }

    fn adapt(&self, module: H::Module, adapter: &Adapter) -> Result<H::Module> {
        match adapter {
            Adapter::Export { key } => self
                .host
                .export(&module, key)
                .ok_or_else(|| anyhow!("no export named '{key}'")),
            Adapter::ExportOr { key } => Ok(self.host.export(&module, key).unwrap_or(module)),
            Adapter::CallMethod { method } => self.host.call(&module, Some(method), &[]),
            Adapter::InvokeWithSetting {
                file,
                pointer,
                option,
            } => {
                let value = read_setting(&self.project_dir.join(file), pointer)?;
                let mut arg = Map::new();
                arg.insert(option.clone(), Value::Array(vec![value]));
                self.host.call(&module, None, &[Value::Object(arg)])
            }
        }
    }
}

fn read_setting(path: &Path, pointer: &str) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    doc.pointer(pointer)
        .cloned()
        .ok_or_else(|| anyhow!("{} has no value at {pointer}", path.display()))
}

// -------------------- node_modules host --------------------

/// Capabilities the platform always provides, no install needed.
pub const BUILTIN_MODULES: &[&str] = &[
    "assert", "buffer", "child_process", "crypto", "events", "fs", "http", "https", "net", "os",
    "path", "process", "querystring", "readline", "stream", "string_decoder", "timers", "tty",
    "url", "util", "vm", "worker_threads", "zlib",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Builtin,
    Package {
        dir: PathBuf,
        version: Option<String>,
        main: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Export(String),
    Call {
        method: Option<String>,
        args: Vec<Value>,
    },
}

/// Where a dependency lives and which exports/calls lead to its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRef {
    pub name: String,
    pub origin: Origin,
    pub access: Vec<Access>,
}

impl ModuleRef {
    fn with(&self, step: Access) -> Self {
        let mut next = self.clone();
        next.access.push(step);
        next
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "require({:?})", self.name)?;
        for step in &self.access {
            match step {
                Access::Export(key) => write!(f, ".{key}")?,
                Access::Call { method, args } => {
                    if let Some(m) = method {
                        write!(f, ".{m}")?;
                    }
                    let args: Vec<String> = args.iter().map(Value::to_string).collect();
                    write!(f, "({})", args.join(", "))?;
                }
            }
        }
        match &self.origin {
            Origin::Builtin => write!(f, "  [builtin]"),
            Origin::Package { dir, version, .. } => write!(
                f,
                "  [{}{}]",
                dir.display(),
                version.as_deref().map(|v| format!(" @ {v}")).unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct PackageInfo {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    main: Option<String>,
}

/// Resolves names against `node_modules` directories, walking up from the
/// project directory. Nothing is executed; the result records how the value
/// would be reached.
#[derive(Debug, Clone)]
pub struct NodeModulesHost {
    root: PathBuf,
}

impl NodeModulesHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.root
            .ancestors()
            .map(|dir| dir.join("node_modules").join(name))
            .find(|dir| dir.join("package.json").is_file())
    }
}

impl ModuleHost for NodeModulesHost {
    type Module = ModuleRef;

    fn load(&self, name: &str) -> Result<ModuleRef> {
        let bare = name.strip_prefix("node:").unwrap_or(name);
        if BUILTIN_MODULES.contains(&bare) {
            return Ok(ModuleRef {
                name: name.to_string(),
                origin: Origin::Builtin,
                access: Vec::new(),
            });
        }

        let Some(dir) = self.locate(name) else {
            bail!(
                "cannot find module '{name}' (searched node_modules from {})",
                self.root.display()
            );
        };

        let manifest = dir.join("package.json");
        let text = fs::read_to_string(&manifest)
            .with_context(|| format!("failed to read {}", manifest.display()))?;
        let info: PackageInfo = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", manifest.display()))?;

        Ok(ModuleRef {
            name: name.to_string(),
            origin: Origin::Package {
                dir,
                version: info.version,
                main: info.main,
            },
            access: Vec::new(),
        })
    }

    fn export(&self, module: &ModuleRef, key: &str) -> Option<ModuleRef> {
        Some(module.with(Access::Export(key.to_string())))
    }

    fn call(&self, module: &ModuleRef, method: Option<&str>, args: &[Value]) -> Result<ModuleRef> {
        Ok(module.with(Access::Call {
            method: method.map(String::from),
            args: args.to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Modules are plain strings; exports only exist when listed.
    struct StubHost {
        exports: Vec<(&'static str, &'static str)>,
        loads: Rc<Cell<usize>>,
    }

    impl ModuleHost for StubHost {
        type Module = String;

        fn load(&self, name: &str) -> Result<String> {
            self.loads.set(self.loads.get() + 1);
            if name == "missing" {
                bail!("not installed");
            }
            Ok(name.to_string())
        }

        fn export(&self, module: &String, key: &str) -> Option<String> {
            self.exports
                .iter()
                .find(|(m, k)| *m == module.as_str() && *k == key)
                .map(|(m, k)| format!("{m}.{k}"))
        }

        fn call(&self, module: &String, method: Option<&str>, args: &[Value]) -> Result<String> {
            let args: Vec<String> = args.iter().map(Value::to_string).collect();
            Ok(match method {
                Some(m) => format!("{module}.{m}({})", args.join(",")),
                None => format!("{module}({})", args.join(",")),
            })
        }
    }

    fn stub() -> (StubHost, Rc<Cell<usize>>) {
        let loads = Rc::new(Cell::new(0));
        let host = StubHost {
            exports: vec![("rollup", "rollup"), ("@rollup/plugin-node-resolve", "nodeResolve")],
            loads: Rc::clone(&loads),
        };
        (host, loads)
    }

    #[test]
    fn default_handling_returns_module() {
        let (host, _) = stub();
        let loader = Loader::new(host, None, default_exceptions(), ".");
        assert_eq!(loader.request("gulp-sass").unwrap(), "gulp-sass");
    }

    #[test]
    fn exceptions_pick_exports_and_calls() {
        let (host, _) = stub();
        let loader = Loader::new(host, None, default_exceptions(), ".");

        assert_eq!(
            loader.request("@rollup/plugin-node-resolve").unwrap(),
            "@rollup/plugin-node-resolve.nodeResolve"
        );
        assert_eq!(loader.request("browser-sync").unwrap(), "browser-sync.create()");
        assert_eq!(loader.request("dotenv").unwrap(), "dotenv.config()");
        // no Minimatch export: falls back to the module
        assert_eq!(loader.request("minimatch").unwrap(), "minimatch");
        // missing required export is an error at access time
        assert!(loader.request("gulp-run-command").is_err());
    }

    #[test]
    fn handler_short_circuits_default_handling() {
        let (host, loads) = stub();
        let handler: ModuleHandler<String> =
            Box::new(|name: &str| (name == "gulp").then(|| "custom".to_string()));
        let loader = Loader::new(host, Some(handler), default_exceptions(), ".");

        assert_eq!(loader.request("gulp").unwrap(), "custom");
        assert_eq!(loads.get(), 0);

        assert_eq!(loader.request("gulp-sass").unwrap(), "gulp-sass");
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn load_failure_names_dependency() {
        let (host, _) = stub();
        let loader = Loader::new(host, None, default_exceptions(), ".");
        let err = loader.request("missing").unwrap_err();
        assert!(format!("{err:#}").contains("missing"));
    }

    #[test]
    fn invoke_with_setting_reads_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{ "paths": { "images": "src/img" } }"#,
        )
        .unwrap();

        let (host, _) = stub();
        let loader = Loader::new(host, None, default_exceptions(), dir.path());
        assert_eq!(
            loader.request("postcss-assets").unwrap(),
            r#"postcss-assets({"loadPaths":["src/img"]})"#
        );
    }

    #[test]
    fn invoke_with_setting_without_file_fails_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let (host, _) = stub();
        let loader = Loader::new(host, None, default_exceptions(), dir.path());
        assert!(loader.request("postcss-assets").is_err());
    }

    #[test]
    fn node_modules_host_resolves_builtins_and_packages() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("gulp-rename");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "name": "gulp-rename", "version": "2.0.0", "main": "index.js" }"#,
        )
        .unwrap();

        let host = NodeModulesHost::new(dir.path().join("sub"));

        let path = host.load("path").unwrap();
        assert_eq!(path.origin, Origin::Builtin);

        let rename = host.load("gulp-rename").unwrap();
        match &rename.origin {
            Origin::Package { version, main, .. } => {
                assert_eq!(version.as_deref(), Some("2.0.0"));
                assert_eq!(main.as_deref(), Some("index.js"));
            }
            other => panic!("unexpected origin {other:?}"),
        }

        assert!(host.load("not-installed").is_err());
    }

    #[test]
    fn module_ref_display_shows_access_path() {
        let host = NodeModulesHost::new(".");
        let base = host.load("stream").unwrap();
        let called = host.call(&base, Some("create"), &[]).unwrap();
        assert_eq!(called.to_string(), r#"require("stream").create()  [builtin]"#);
    }
}
