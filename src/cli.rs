use clap::Parser;
use std::path::PathBuf;

use depalias::Options;

#[derive(Parser, Debug)]
#[command(name = "depalias", version, about)]
pub struct Args {
    /// Project directory containing package.json (defaults to the current directory)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Path to depalias.toml (overrides DEPALIAS_CONFIG and the default locations)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Suppress the alias report
    #[arg(long = "no-log", default_value_t = false)]
    pub no_log: bool,

    /// Keep every identifier at the top level instead of nesting vendor groups
    #[arg(long = "no-scope", default_value_t = false)]
    pub no_scope: bool,

    /// Prefix to strip from identifiers; repeatable, replaces the configured list
    #[arg(long = "truncate", value_name = "PREFIX")]
    pub truncators: Vec<String>,

    /// Treat this run as a development context (ENVIRONMENT=dev)
    #[arg(long, default_value_t = false)]
    pub dev: bool,

    /// Resolve an identifier (`name` or `group.name`) and print how it loads
    #[arg(long, value_name = "IDENT")]
    pub resolve: Vec<String>,
}

impl Args {
    /// CLI flags win over settings-file values.
    pub fn apply<M>(&self, options: &mut Options<M>) {
        if self.no_log {
            options.log = false;
        }
        if self.no_scope {
            options.scope = false;
        }
        if !self.truncators.is_empty() {
            options.name_truncators = self.truncators.clone();
        }
    }
}
