//! `diff` - preview what apply would change

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ExecutionPlan, Resource, compute_diffs};
use std::collections::HashSet;
use std::fs;

use super::{build_plan, load};
use crate::Context;
use crate::cli::TargetArgs;
use crate::engine::differ::{display_diff, display_file_diff};
use crate::progress;
use crate::resource::XmlTransform;
use crate::ui;

/// Text a file holds now and would hold after apply
#[derive(Debug)]
pub struct FilePreview {
    pub target: String,
    pub before: String,
    pub after: String,
}

/// Chain every selected transform of each file in memory
///
/// Transforms on the same file see each other's output, in declaration
/// order, exactly as apply would run them. Files left unchanged are
/// omitted. A file whose chain fails yields an error for that file only.
pub fn previews(plan: &ExecutionPlan, resources: &[XmlTransform]) -> Vec<Result<FilePreview>> {
    let selected: HashSet<String> = plan.resources().map(|r| r.id()).collect();

    plan.groups
        .iter()
        .filter_map(|group| {
            let transforms: Vec<&XmlTransform> = resources
                .iter()
                .filter(|r| r.target() == group.target && selected.contains(&r.name))
                .collect();
            preview_file(&group.target, &transforms).transpose()
        })
        .collect()
}

fn preview_file(target: &str, transforms: &[&XmlTransform]) -> Result<Option<FilePreview>> {
    let Some(first) = transforms.first() else {
        return Ok(None);
    };

    let before = fs::read(&first.path)
        .with_context(|| format!("Failed to read {}", first.path.display()))?;
    let mut bytes = before.clone();
    for transform in transforms {
        let write_back = transform.transform_bytes(&bytes)?;
        if write_back.changed {
            bytes = write_back.bytes;
        }
    }

    if bytes == before {
        return Ok(None);
    }
    Ok(Some(FilePreview {
        target: target.to_string(),
        before: String::from_utf8_lossy(&before).into_owned(),
        after: String::from_utf8_lossy(&bytes).into_owned(),
    }))
}

pub fn run(ctx: &Context, args: TargetArgs) -> Result<()> {
    let loaded = load(ctx)?;
    let plan = build_plan(loaded.resources.clone(), args.target.as_deref());

    let spinner = progress::spinner("Reading target files...");
    let diffs = compute_diffs(plan.resources());
    spinner.finish_and_clear();
    display_diff(&diffs);
    if diffs.is_empty() {
        return Ok(());
    }

    let broken: HashSet<&str> = diffs
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.target.as_str())
        .collect();
    let readable = plan.filter(|r| !broken.contains(r.target().as_str()));

    let mut unpreviewable = broken.len();
    for preview in previews(&readable, &loaded.resources) {
        match preview {
            Ok(preview) => display_file_diff(&preview.target, &preview.before, &preview.after),
            Err(e) => {
                println!();
                ui::warn(&format!("{e:#}"));
                unpreviewable += 1;
            }
        }
    }

    if unpreviewable > 0 {
        println!();
        ui::warn(&format!(
            "{unpreviewable} file(s) could not be previewed; fix the errors above first"
        ));
    }

    Ok(())
}
