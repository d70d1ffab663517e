use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;

use depalias::{AliasResolver, NodeModulesHost, Options, PackageManifest, ProjectEnv, Settings};

mod cli;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let root = match &args.project {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };

    let mut env = ProjectEnv::new(&root);
    env.load_dotenv()?;
    if args.dev {
        env.set_var("ENVIRONMENT", "dev");
    }

    let manifest = PackageManifest::load_from_dir(&root)?;
    let project = env.publish_project(manifest.name.as_deref());
    env.export_project();
    log::debug!("project: {project}");

    let mut options = Options::default();
    if let Some(path) = env.locate_settings(args.config.as_ref())? {
        log::debug!("settings: {}", path.display());
        Settings::load_from_path(&path)?.apply(&mut options);
    }
    args.apply(&mut options);

    let table = AliasResolver::new(options).build(&manifest, NodeModulesHost::new(&root), &env);

    for ident in &args.resolve {
        let Some(accessor) = table.lookup(ident) else {
            bail!("no identifier '{ident}' in the resolved table");
        };
        match accessor.get() {
            Ok(module) => println!("{ident} = {module}"),
            Err(e) => log::error!("{ident}: {e:#}"),
        }
    }

    Ok(())
}
