use anyhow::{bail, Context as _, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const SETTINGS_FILE: &str = "depalias.toml";
pub const DOTENV_FILE: &str = ".env";

/// Snapshot of the process environment for one project directory.
#[derive(Debug, Clone)]
pub struct ProjectEnv {
    vars: BTreeMap<String, String>,
    root: PathBuf,
    settings_path: Option<PathBuf>,
}

impl ProjectEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_vars(root, std::env::vars().collect())
    }

    pub fn from_vars(root: impl Into<PathBuf>, vars: BTreeMap<String, String>) -> Self {
        Self {
            vars,
            root: root.into(),
            settings_path: None,
        }
    }

    // ---------- public getters ----------

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    /// `ENVIRONMENT=dev` marks a development run.
    pub fn is_dev(&self) -> bool {
        self.var("ENVIRONMENT").map(str::trim) == Some("dev")
    }

    // ---------- .env ----------

    /// Merge `<root>/.env` into the snapshot. Existing keys are never overwritten.
    /// Returns the number of keys added.
    pub fn load_dotenv(&mut self) -> Result<usize> {
        let path = self.root.join(DOTENV_FILE);
        if !path.is_file() {
            return Ok(0);
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read env file at {}", path.display()))?;

        let mut added = 0;
        for (k, v) in parse_env_text(&text) {
            if !self.vars.contains_key(&k) {
                self.vars.insert(k, v);
                added += 1;
            }
        }
        log::debug!("loaded {added} variable(s) from {}", path.display());
        Ok(added)
    }

    // ---------- project name ----------

    /// Record the title-cased project name as `PROJECT` and return it.
    pub fn publish_project(&mut self, name: Option<&str>) -> String {
        let title = project_title(name);
        self.vars.insert("PROJECT".to_string(), title.clone());
        title
    }

    /// Push `PROJECT` into the real process environment.
    pub fn export_project(&self) {
        if let Some(title) = self.vars.get("PROJECT") {
            std::env::set_var("PROJECT", title);
        }
    }

    // ---------- settings file ----------

    /// Settings path precedence:
    /// 1) CLI --config (must exist)
    /// 2) DEPALIAS_CONFIG (must exist)
    /// 3) <root>/depalias.toml
    /// 4) <config dir>/depalias/config.toml
    ///
    /// `None` when nothing is found; defaults apply.
    pub fn locate_settings(&mut self, cli_config: Option<&PathBuf>) -> Result<Option<PathBuf>> {
        let found = if let Some(p) = cli_config {
            if !p.exists() {
                bail!("--config was provided but file does not exist: {}", p.display());
            }
            Some(p.clone())
        } else if let Some(p) = self.get_env_path("DEPALIAS_CONFIG") {
            if !p.exists() {
                bail!(
                    "DEPALIAS_CONFIG is set but file does not exist: {}",
                    p.display()
                );
            }
            Some(p)
        } else {
            let local = self.root.join(SETTINGS_FILE);
            let user = dirs::config_dir().map(|d| d.join("depalias").join("config.toml"));
            std::iter::once(local)
                .chain(user)
                .find(|p| p.is_file())
        };

        self.settings_path = found.clone();
        Ok(found)
    }

    fn get_env_path(&self, key: &str) -> Option<PathBuf> {
        self.vars
            .get(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

/// `KEY=value` lines; `#` comments, blank lines and an `export ` prefix are
/// allowed, surrounding quotes are stripped. Lines without `=` are skipped.
pub fn parse_env_text(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (idx, line) in text.lines().enumerate() {
        let raw = line.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let raw = raw.strip_prefix("export ").unwrap_or(raw);

        let Some((k, v)) = raw.split_once('=') else {
            log::debug!("skipping env line {}: {}", idx + 1, raw);
            continue;
        };

        let key = k.trim().to_string();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.insert(key, val);
    }
    out
}

/// `my-cool site` -> `My Cool Site`. Only the first `-` becomes a space.
pub fn project_title(name: Option<&str>) -> String {
    let raw = match name {
        Some(n) if !n.is_empty() => n.replacen('-', " ", 1),
        _ => "Project".to_string(),
    };

    raw.to_lowercase()
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
