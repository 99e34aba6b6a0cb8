use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use strata_core::{config::Config, io, paths, types::Collection};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "strata".to_string());

    let mut created = Vec::new();

    let base = paths::strata_dir(root);
    io::ensure_dir(&base).with_context(|| format!("failed to create {}", base.display()))?;
    for collection in Collection::all() {
        let dir = paths::collection_dir(root, *collection);
        io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let wrote = Config::new(&project_name)
        .save_if_missing(root)
        .context("failed to write config.yaml")?;
    if wrote {
        created.push(paths::CONFIG_FILE);
    }

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "project": project_name,
            "created": created,
        }))?;
    } else {
        println!("Initialized strata in: {}", root.display());
        if created.is_empty() {
            println!("  exists:  {}", paths::CONFIG_FILE);
        } else {
            for path in created {
                println!("  created: {path}");
            }
        }
    }
    Ok(())
}
