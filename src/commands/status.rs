//! `status` - which transforms hold and which have drifted

use anyhow::Result;
use colored::Colorize;
use declarative::{ExecutionPlan, Resource, ResourceState};
use serde::Serialize;

use super::{build_plan, load};
use crate::Context;
use crate::cli::StatusArgs;
use crate::progress;
use crate::ui;

/// Outcome of comparing one transform against its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Satisfied,
    Drifted,
    Error,
}

/// One row of the status report
#[derive(Debug, Serialize)]
pub struct StatusEntry {
    pub name: String,
    pub target: String,
    pub description: String,
    pub verdict: Verdict,
    pub current: ResourceState,
    pub desired: ResourceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusEntry {
    fn from_resource(resource: &dyn Resource) -> Self {
        let desired = resource.desired_state();
        let (verdict, current, error) = match resource.current_state() {
            Ok(current) if current == desired => (Verdict::Satisfied, current, None),
            Ok(current) => (Verdict::Drifted, current, None),
            Err(e) => (Verdict::Error, ResourceState::Unknown, Some(format!("{e:#}"))),
        };

        Self {
            name: resource.id(),
            target: resource.target(),
            description: resource.description(),
            verdict,
            current,
            desired,
            error,
        }
    }
}

/// Evaluate every resource in plan order
pub fn collect(plan: &ExecutionPlan) -> Vec<StatusEntry> {
    plan.resources()
        .map(|resource| StatusEntry::from_resource(resource))
        .collect()
}

pub fn run(ctx: &Context, args: StatusArgs) -> Result<()> {
    let loaded = load(ctx)?;
    let plan = build_plan(loaded.resources, args.target.as_deref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&collect(&plan))?);
        return Ok(());
    }

    let spinner = progress::spinner("Reading target files...");
    let entries = collect(&plan);
    spinner.finish_and_clear();

    if entries.is_empty() {
        ui::info("No transforms match");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Transform Status");
        ui::kv("Manifest", &loaded.path.display().to_string());
    }

    let mut current_target = None;
    for entry in &entries {
        if current_target != Some(entry.target.as_str()) {
            ui::section(&ui::truncate_path(&entry.target, 60));
            current_target = Some(entry.target.as_str());
        }

        match entry.verdict {
            Verdict::Satisfied => {
                println!("  {} {}", "✓".green(), entry.name);
                if ctx.verbose > 0 {
                    ui::dim(&entry.description);
                }
            }
            Verdict::Drifted => {
                println!(
                    "  {} {:<30} {}",
                    "~".yellow(),
                    entry.name,
                    format!("{} → {}", entry.current, entry.desired).dimmed()
                );
            }
            Verdict::Error => {
                println!(
                    "  {} {:<30} {}",
                    "✗".red(),
                    entry.name,
                    entry.error.as_deref().unwrap_or_default().red()
                );
            }
        }
    }

    let count = |verdict| entries.iter().filter(|e| e.verdict == verdict).count();
    let (satisfied, drifted, errors) = (
        count(Verdict::Satisfied),
        count(Verdict::Drifted),
        count(Verdict::Error),
    );

    println!();
    if drifted == 0 && errors == 0 {
        ui::success(&format!("All {satisfied} transforms hold"));
    } else {
        ui::warn(&format!(
            "{satisfied} hold, {drifted} drifted, {errors} unreadable - run `xmlconverge diff` for details"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::XmlTransform;
    use std::fs;
    use tempfile::TempDir;
    use xmlkit::{Declaration, TransformKind};

    #[test]
    fn test_collect_verdicts() {
        let dir = TempDir::new().unwrap();
        let web = dir.path().join("web.config");
        fs::write(&web, r#"<configuration><a x="1"/><b/></configuration>"#).unwrap();

        let remove_b = Declaration::new("//b", TransformKind::Remove, None, false).unwrap();
        let remove_c = Declaration::new("//c", TransformKind::Remove, None, false).unwrap();
        let missing = dir.path().join("missing.config");

        let resources = vec![
            XmlTransform::new("remove_b", &web, remove_b),
            XmlTransform::new("remove_c", &web, remove_c.clone()),
            XmlTransform::new("unreadable", &missing, remove_c),
        ];
        let entries = collect(&build_plan(resources, None));

        let verdicts: Vec<(&str, Verdict)> =
            entries.iter().map(|e| (e.name.as_str(), e.verdict)).collect();
        assert_eq!(
            verdicts,
            vec![
                ("remove_b", Verdict::Drifted),
                ("remove_c", Verdict::Satisfied),
                ("unreadable", Verdict::Error),
            ]
        );
        assert!(entries[2].error.as_deref().unwrap().contains("missing.config"));

        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["verdict"], "drifted");
        assert_eq!(json[0]["desired"], "Absent");
        assert!(json[1].get("error").is_none());
    }
}
