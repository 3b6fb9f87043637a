//! CLI output formatting for the detect, slice and export steps.
//!
//! # Information-First Display
//!
//! Every task is shown by its queue position and name first, followed by
//! the parameters that matter for it. File paths are secondary context on
//! indented `Source:` lines.
//!
//! # Output Format
//!
//! ## Detect
//!
//! ```text
//! 001 hero  3x3  16:9
//!     Source: sheets/hero.png
//! 002 broken  error
//!     Source: sheets/broken.png
//!     Failed to decode image: ...
//! ```
//!
//! ## Slice
//!
//! ```text
//! 001 hero (3x3, 16:9)
//!     55%
//!     100%
//!     completed: 9 shots
//! ```
//!
//! ## Export
//!
//! ```text
//! 001 hero → PRJ_SC01_hero_K3ZQ/ (2 shots)
//! Exported 2 shots from 1 task → out/PRJ_SC01_Export_Package
//! ```
//!
//! # Architecture
//!
//! Each step has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::export::ExportReport;
use crate::imaging::{AspectRatio, GridSpec};
use crate::task::{RunSummary, Task, TaskEvent, TaskOutcome, TaskStatus};

/// Format a 0-based queue position as a 3-digit zero-padded 1-based index.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn params(grid: GridSpec, ratio: AspectRatio) -> String {
    format!("{grid}  {ratio}")
}

// ============================================================================
// Detect
// ============================================================================

/// Format the analysis of every task in the queue.
pub fn format_analysis(tasks: &[Task]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, task) in tasks.iter().enumerate() {
        match task.status {
            TaskStatus::Error => {
                lines.push(format!("{} {}  error", format_index(i), task.name));
                lines.push(format!("{}Source: {}", indent(1), task.source.display()));
                if let Some(err) = &task.error {
                    lines.push(format!("{}{}", indent(1), err));
                }
            }
            _ => {
                lines.push(format!(
                    "{} {}  {}",
                    format_index(i),
                    task.name,
                    params(task.grid, task.ratio)
                ));
                lines.push(format!("{}Source: {}", indent(1), task.source.display()));
            }
        }
    }
    lines
}

pub fn print_analysis(tasks: &[Task]) {
    for line in format_analysis(tasks) {
        println!("{}", line);
    }
}

/// Format the warning shown when tasks disagree with the global parameters.
pub fn format_mismatch(tasks: &[Task], mismatched: &[usize], global: (GridSpec, AspectRatio)) -> Vec<String> {
    if mismatched.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "Parameter mismatch with global {} ({}):",
        params(global.0, global.1),
        plural(mismatched.len(), "task")
    )];
    for &i in mismatched {
        if let Some(task) = tasks.get(i) {
            lines.push(format!(
                "{}{} {}  {}",
                indent(1),
                format_index(i),
                task.name,
                params(task.grid, task.ratio)
            ));
        }
    }
    lines.push("Use --apply-global to slice every task with the global parameters.".into());
    lines
}

pub fn print_mismatch(tasks: &[Task], mismatched: &[usize], global: (GridSpec, AspectRatio)) {
    for line in format_mismatch(tasks, mismatched, global) {
        println!("{}", line);
    }
}

// ============================================================================
// Slice
// ============================================================================

/// Format a single slicing event as display lines.
pub fn format_task_event(event: &TaskEvent) -> Vec<String> {
    match event {
        TaskEvent::TaskStarted {
            index,
            name,
            grid,
            ratio,
        } => vec![format!("{} {} ({}, {})", format_index(*index), name, grid, ratio)],
        // The 10% start marker carries no information on a terminal.
        TaskEvent::Progress { progress, .. } if *progress <= 10.0 => Vec::new(),
        TaskEvent::Progress { progress, .. } => {
            vec![format!("{}{:.0}%", indent(1), progress)]
        }
        TaskEvent::TaskFinished { outcome, .. } => match outcome {
            TaskOutcome::Completed { shots } => {
                vec![format!("{}completed: {}", indent(1), plural(*shots, "shot"))]
            }
            TaskOutcome::Failed { error } => vec![format!("{}error: {}", indent(1), error)],
        },
    }
}

pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let mut line = format!("Sliced {}", plural(summary.completed, "task"));
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    if summary.skipped > 0 {
        line.push_str(&format!(", {} already done", summary.skipped));
    }
    vec![line]
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format the export result: one line per exported task, then a total.
pub fn format_export(report: Option<&ExportReport>) -> Vec<String> {
    let Some(report) = report else {
        return vec!["No shots selected, nothing exported".into()];
    };
    let mut lines: Vec<String> = report
        .manifest
        .tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            format!(
                "{} {} → {}/ ({})",
                format_index(i),
                task.name,
                task.folder,
                plural(task.files.len(), "shot")
            )
        })
        .collect();
    lines.push(format!(
        "Exported {} from {} → {}",
        plural(report.file_count(), "shot"),
        plural(report.manifest.tasks.len(), "task"),
        report.root.display()
    ));
    lines
}

pub fn print_export(report: Option<&ExportReport>) {
    for line in format_export(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
