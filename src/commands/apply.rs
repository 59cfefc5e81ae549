//! `apply` - converge every selected file

use anyhow::{Result, bail};

use super::{build_plan, load};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine::{self, ExecuteOptions};
use crate::ui;

const DEFAULT_JOBS: usize = 4;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let loaded = load(ctx)?;
    let jobs = args
        .jobs
        .or(loaded.manifest.settings.jobs)
        .unwrap_or(DEFAULT_JOBS)
        .max(1);

    let plan = build_plan(loaded.resources, args.target.as_deref());
    if plan.is_empty() {
        match args.target {
            Some(target) => ui::warn(&format!("No transforms match '{target}'")),
            None => ui::info("The manifest declares no transforms"),
        }
        return Ok(());
    }

    log::info!(
        "Applying {} transforms across {} files with {} jobs",
        plan.total_resources(),
        plan.groups.len(),
        jobs
    );

    let summary = engine::execute(
        plan,
        ExecuteOptions {
            dry_run: args.dry_run,
            jobs,
            yes: args.yes,
            verbose: ctx.verbose > 0,
        },
    )?;

    if !summary.is_success() {
        bail!("{} transform(s) failed", summary.failed);
    }

    Ok(())
}
