use std::path::Path;
use wtflow_core::{ContextResolver, EnvironmentContext};

pub fn handle(cwd: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let ctx = ContextResolver::discover(cwd)?.resolve(name)?;
    print!("{}", render_exports(&ctx));
    Ok(())
}

/// `eval "$(wtflow env)"` で読み込める export 行
pub fn render_exports(ctx: &EnvironmentContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("export WTFLOW_ENV={}\n", ctx.kind));
    out.push_str(&format!("export WTFLOW_SLOT={}\n", ctx.slot));
    out.push_str(&format!("export COMPOSE_PROJECT_NAME={}\n", ctx.namespace));
    for mapping in ctx.ports() {
        out.push_str(&format!(
            "export {}_{}_PORT={}\n",
            env_key(&mapping.service),
            env_key(&mapping.port),
            mapping.host
        ));
    }
    out
}

fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}
