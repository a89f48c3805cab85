//! CLI output formatting

use crate::{
    core::{ActionErrorKind, ExecutionStatus},
    execution::{ExecutionEvent, ExecutionPlan},
    persistence::RunSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar counting finished levels
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let template = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}");
    if let Ok(bar_style) = template {
        progress.set_style(bar_style.progress_chars("#>-"));
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Horizontal rule as wide as the terminal
pub fn separator() -> String {
    let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80);
    "─".repeat(width)
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Format a captured step log between separators
pub fn format_step_log(step_id: &str, log: &str) -> String {
    let rule = separator();
    let body = if log.is_empty() {
        style("(no output)").dim().to_string()
    } else {
        log.trim_end().to_string()
    };
    format!(
        "{}\n{} {}\n{}\n{}",
        style(&rule).dim(),
        style("log:").dim(),
        style(step_id).bold(),
        body,
        style(&rule).dim()
    )
}

/// Format an execution event for display.
///
/// Returns `None` for events that have no console line of their own.
pub fn format_execution_event(event: &ExecutionEvent) -> Option<String> {
    let line = match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            levels,
        } => format!(
            "{} Starting pipeline {} ({}, {} levels)",
            ROCKET,
            style(pipeline_name).bold(),
            style(short_id(execution_id)).dim(),
            levels
        ),
        ExecutionEvent::LevelStarted { index, step_ids } => format!(
            "{} Level {}: {}",
            SPINNER,
            style(index).cyan(),
            step_ids.join(", ")
        ),
        ExecutionEvent::StepStarted { .. } | ExecutionEvent::StepLog { .. } => return None,
        ExecutionEvent::StepSucceeded { step_id } => format!("{} {}", CHECK, style(step_id).green()),
        ExecutionEvent::StepSkipped { step_id } => format!(
            "{} {} {}",
            SKIP,
            style(step_id).dim(),
            style("(condition not met)").dim()
        ),
        ExecutionEvent::StepFailed { step_id, kind, error } => format!(
            "{} {} [{}]: {}",
            CROSS,
            style(step_id).red(),
            style(kind).red().bold(),
            style(error).dim()
        ),
        ExecutionEvent::PipelineFinished { execution_id, status } => {
            let status_str = match status {
                ExecutionStatus::Completed => format!("{} completed", style("successfully").green()),
                ExecutionStatus::Failed => style("failed").red().to_string(),
                other => format!("{:?}", other),
            };
            format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(short_id(execution_id)).dim(),
                status_str
            )
        }
    };
    Some(line)
}

/// Format a failure headline: step id then error kind
pub fn format_failure(step_id: &str, kind: ActionErrorKind, message: &str) -> String {
    format!(
        "{} Step {} failed: {} ({})",
        CROSS,
        style(step_id).red().bold(),
        style(kind).red(),
        message
    )
}

/// Format the levels of a plan, one line per level
pub fn format_plan(plan: &ExecutionPlan, step_ids: &[Vec<String>]) -> String {
    let mut lines = vec![format!(
        "{} {} steps in {} levels",
        INFO,
        style(plan.step_count()).cyan(),
        style(plan.len()).cyan()
    )];
    for (index, ids) in step_ids.iter().enumerate() {
        lines.push(format!("  {} {}", style(format!("[{}]", index)).dim(), ids.join(", ")));
    }
    lines.join("\n")
}

/// Format a run summary for history listings
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        _ => INFO,
    };

    let failure = match (&summary.failed_step, summary.failure_kind) {
        (Some(step), Some(kind)) => format!(" - {} {}", style(step).red(), style(kind).dim()),
        _ => String::new(),
    };

    format!(
        "{} {} - {} - {} ({} ok, {} skipped, {} not started){} - {}",
        status_icon,
        style(short_id(&summary.execution_id)).dim(),
        style(&summary.pipeline_name).bold(),
        format_status(summary.status),
        summary.succeeded_steps,
        summary.skipped_steps,
        summary.not_started(),
        failure,
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S")).dim()
    )
}

/// Human-readable duration
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
