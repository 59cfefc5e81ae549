//! Diff display - resource table and file previews

use colored::Colorize;
use declarative::{DiffSummary, ResourceDiff, ResourceState, group_by_target};
use similar::TextDiff;

use crate::ui;

/// Lines of unchanged context around each hunk of a file preview
const CONTEXT_LINES: usize = 3;

/// Widest target path shown in the table before it is shortened
const TARGET_WIDTH: usize = 48;

/// Display a list of diffs in a user-friendly format
///
/// Diffs are grouped by the file they write to, in plan order.
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Transform Diff".bold()
    );
    println!("│");

    for (target, target_diffs) in group_by_target(diffs) {
        println!("│ {}", ui::truncate_path(target, TARGET_WIDTH).bold());

        for diff in target_diffs {
            println!(
                "│   {} {:<30} {}",
                symbol(diff),
                diff.resource_id,
                state_description(diff).dimmed()
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} modify, {} remove, {} unreadable)",
        summary.total().to_string().bold(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red(),
        summary.errors.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn symbol(diff: &ResourceDiff) -> colored::ColoredString {
    if diff.is_error() {
        return "!".red().bold();
    }
    match (&diff.current, &diff.desired) {
        (ResourceState::Absent, ResourceState::Present { .. }) => "+".green(),
        (ResourceState::Present { .. }, ResourceState::Absent) => "-".red(),
        (ResourceState::Modified { .. }, _) | (_, ResourceState::Modified { .. }) => "~".yellow(),
        _ => "?".dimmed(),
    }
}

fn state_description(diff: &ResourceDiff) -> String {
    if let Some(error) = &diff.error {
        return format!("(error: {error})");
    }
    match (&diff.current, &diff.desired) {
        (ResourceState::Present { details }, ResourceState::Absent) => match details {
            Some(details) => format!("(will remove {details})"),
            None => "(will remove)".to_string(),
        },
        (ResourceState::Modified { from, to }, _) => format!("{from} → {to}"),
        (current, desired) => format!("{current} → {desired}"),
    }
}

/// Render a unified diff between two versions of a file
pub fn unified_diff(path: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

/// Print a colored unified diff of a file
pub fn display_file_diff(path: &str, before: &str, after: &str) {
    println!();
    for line in unified_diff(path, before, after).lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else {
            println!("{}", line.dimmed());
        }
    }
}
