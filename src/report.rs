use anyhow::Result;
use minijinja::Environment;
use serde_json::json;

use crate::{host::ModuleHost, table::ResolvedTable};

pub const NO_PACKAGES: &str =
    "No packages were loaded. Check your package.json for devDependencies";

const RULE: &str =
    "==============================================================================";

const USAGE_TEMPLATE: &str = r#"let {
{%- for g in groups %}
    {{ g.name }}: { {{ g.idents | join(", ") }} },
{%- endfor %}
{%- if top %}
    {{ top | join(", ") }}
{%- endif %}
} = depalias::resolve(&manifest, host, Options::default(), &env);"#;

/// Original name -> final identifier, one line each, originals padded.
pub fn render_mappings<H: ModuleHost>(table: &ResolvedTable<H>) -> String {
    let width = table
        .mappings()
        .iter()
        .map(|m| m.original.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for m in table.mappings() {
        out.push_str(&format!("{:<width$} => {}\n", m.original, m.path()));
    }
    out
}

/// The whole table as a nested destructuring shape.
pub fn render_usage<H: ModuleHost>(table: &ResolvedTable<H>) -> Result<String> {
    let groups: Vec<_> = table
        .groups()
        .map(|(name, ns)| json!({ "name": name, "idents": ns.keys().collect::<Vec<_>>() }))
        .collect();
    let top: Vec<&str> = table.top().keys().collect();

    let mut env = Environment::new();
    env.add_template("usage", USAGE_TEMPLATE)?;
    let tpl = env.get_template("usage")?;
    Ok(tpl.render(json!({ "groups": groups, "top": top }))?)
}

/// Full report, as emitted line by line.
pub fn render<H: ModuleHost>(table: &ResolvedTable<H>) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!(
        "{} packages have been loaded and will be exported.\n",
        table.mappings().len()
    ));
    out.push_str("Their original references have been sanitised to the following aliases:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&render_mappings(table));

    out.push_str(RULE);
    out.push('\n');
    out.push_str("You can destructure all your dependencies using the following shape:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&render_usage(table)?);
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
    out.push_str("It's recommended that you only extract what you need, not everything.\n");

    Ok(out)
}

pub fn emit<H: ModuleHost>(table: &ResolvedTable<H>) {
    match render(table) {
        Ok(text) => {
            for line in text.lines() {
                log::info!("{line}");
            }
        }
        Err(e) => log::warn!("failed to render alias report: {e:#}"),
    }
}
