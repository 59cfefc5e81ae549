//! Execution engine - applies target groups in parallel, resources within a
//! group in order

use crate::context::{ApplyContext, AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback};
use crate::diff::compute_diffs;
use crate::planner::{ExecutionPlan, TargetGroup};
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;
use rayon::prelude::*;

/// Execute a plan with the given options and callbacks
///
/// Nothing is applied when no resource differs from its desired state.
/// On a dry run the pending changes are counted as skipped and no resource
/// is applied. Otherwise the user is asked to confirm before any change.
pub fn execute<P, C>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let diffs = compute_diffs(plan.resources());
    if diffs.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    if opts.dry_run || !confirm.confirm("Apply changes?")? {
        return Ok(ExecuteSummary::all_skipped(diffs.len()));
    }

    let mut summary = ExecuteSummary::default();
    let results = if opts.jobs <= 1 || plan.groups.len() == 1 {
        execute_sequential(&plan.groups, opts.verbose, progress)
    } else {
        execute_parallel(&plan.groups, opts.jobs, opts.verbose, progress)?
    };
    for result in &results {
        summary.record(result);
    }
    progress.on_complete();

    Ok(summary)
}

/// Apply every group on the calling thread, reporting as it goes
fn execute_sequential<P: ProgressCallback>(
    groups: &[TargetGroup],
    verbose: bool,
    progress: &mut P,
) -> Vec<ApplyResult> {
    let mut results = Vec::new();
    for group in groups {
        progress.on_group_start(&group.target, group.resources.len());
        for resource in &group.resources {
            progress.on_resource_start(&resource.id(), &resource.description());
            let result = apply_resource(resource.as_ref(), verbose);
            progress.on_resource_complete(&resource.id(), &result);
            results.push(result);
        }
    }
    results
}

/// Apply groups concurrently using rayon
///
/// Each group is a single task, so resources sharing a target never run at
/// the same time. The progress callback is not thread-safe; results are
/// reported once all groups are done.
fn execute_parallel<P: ProgressCallback>(
    groups: &[TargetGroup],
    jobs: usize,
    verbose: bool,
    progress: &mut P,
) -> Result<Vec<ApplyResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let per_group: Vec<Vec<(String, ApplyResult)>> = pool.install(|| {
        groups
            .par_iter()
            .map(|group| {
                group
                    .resources
                    .iter()
                    .map(|resource| (resource.id(), apply_resource(resource.as_ref(), verbose)))
                    .collect()
            })
            .collect()
    });

    let mut results = Vec::new();
    for (group, group_results) in groups.iter().zip(per_group) {
        progress.on_group_start(&group.target, group_results.len());
        for (id, result) in group_results {
            progress.on_resource_complete(&id, &result);
            results.push(result);
        }
    }
    Ok(results)
}

/// Apply a single resource
fn apply_resource(resource: &dyn Resource, verbose: bool) -> ApplyResult {
    let mut ctx = ApplyContext::new(false, verbose);

    match resource.apply(&mut ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(plan: ExecutionPlan, opts: ExecuteOptions) -> Result<ExecuteSummary> {
    execute(plan, opts, &mut NoProgress, &mut AutoConfirm)
}
