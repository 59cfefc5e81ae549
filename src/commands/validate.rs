//! `validate` - check the manifest without touching any XML file

use anyhow::Result;
use std::collections::HashSet;

use super::load;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let loaded = load(ctx)?;
    let files: HashSet<&std::path::Path> =
        loaded.resources.iter().map(|r| r.path.as_path()).collect();

    if !ctx.quiet {
        ui::header("Manifest");
        ui::kv("Path", &loaded.path.display().to_string());
        ui::kv(
            "Format",
            if loaded.manifest.settings.preventformat.0 {
                "preserve"
            } else {
                "indent"
            },
        );
        if let Some(jobs) = loaded.manifest.settings.jobs {
            ui::kv("Jobs", &jobs.to_string());
        }

        ui::section("Transforms");
        for resource in &loaded.resources {
            println!("  {:<30} {}", resource.name, resource.kind());
            ui::dim(&format!(
                "{} in {}",
                resource.declaration.selector,
                resource.path.display()
            ));
        }
        println!();
    }

    ui::success(&format!(
        "Manifest is valid: {} transforms across {} files",
        loaded.resources.len(),
        files.len()
    ));
    Ok(())
}
