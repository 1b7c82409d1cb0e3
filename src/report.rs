//! Report rendering (ambient, not core)
//!
//! HTML templating is out of scope here; a `ComparisonResult` only
//! contracts an optional `report_path`, not what's inside it. This module
//! renders a human-readable Markdown report instead of the original
//! prototype's templated HTML (`reporting.py`'s Jinja2 report), and
//! exposes a [`ReportRenderer`] trait so a caller can swap in real HTML
//! templating without touching the core engine.

use crate::model::SchemaDiff;
use crate::orchestrator::PairOutcome;
use crate::summary::Summary;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a renderer needs to describe one pair's outcome.
pub struct ReportContext<'a> {
    pub relative_path: &'a Path,
    pub before_path: &'a Path,
    pub after_path: &'a Path,
    pub outcome: &'a PairOutcome,
}

/// Renders a [`ReportContext`] to a string. The default implementation
/// ([`MarkdownRenderer`]) is the one this crate ships; a caller wanting
/// templated HTML (as the original prototype had) implements this trait
/// without touching `orchestrator` or `model`.
pub trait ReportRenderer {
    fn render(&self, ctx: &ReportContext) -> String;
}

/// The report format this crate actually ships.
pub struct MarkdownRenderer;

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, ctx: &ReportContext) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Comparison report: {}", ctx.relative_path.display());
        let _ = writeln!(out);
        let _ = writeln!(out, "- **Before**: `{}`", ctx.before_path.display());
        let _ = writeln!(out, "- **After**: `{}`", ctx.after_path.display());
        let _ = writeln!(out, "- **Status**: `{}`", ctx.outcome.result.status_str);
        if let Some(details) = &ctx.outcome.result.details {
            let _ = writeln!(out, "- **Details**: {details}");
        }
        let _ = writeln!(out);

        render_schema_diff(&mut out, &ctx.outcome.schema_diff);

        if let Some(summary) = &ctx.outcome.summary {
            render_summary(&mut out, summary);
        }

        if let Some(data) = &ctx.outcome.data {
            render_modified_sample(&mut out, data);
        }

        out
    }
}

fn render_schema_diff(out: &mut String, diff: &SchemaDiff) {
    let _ = writeln!(out, "## Schema");
    let _ = writeln!(out);
    if diff.identical() {
        let _ = writeln!(out, "Schemas are identical.");
        let _ = writeln!(out);
        return;
    }

    if !diff.added.is_empty() {
        let _ = writeln!(out, "**Added columns**:");
        for (name, ty) in &diff.added {
            let _ = writeln!(out, "- `{name}` ({ty})");
        }
    }
    if !diff.removed.is_empty() {
        let _ = writeln!(out, "**Removed columns**:");
        for (name, ty) in &diff.removed {
            let _ = writeln!(out, "- `{name}` ({ty})");
        }
    }
    if !diff.type_changes.is_empty() {
        let _ = writeln!(out, "**Type changes**:");
        for (name, (before_ty, after_ty)) in &diff.type_changes {
            let _ = writeln!(out, "- `{name}`: {before_ty} -> {after_ty}");
        }
    }
    let _ = writeln!(out);
}

fn render_summary(out: &mut String, summary: &Summary) {
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Rows added | Rows deleted | Rows modified |");
    let _ = writeln!(out, "|---|---|---|");
    let _ = writeln!(
        out,
        "| {} | {} | {} |",
        summary.rows_added, summary.rows_deleted, summary.rows_modified
    );
    let _ = writeln!(out);

    if !summary.top_modified_columns.is_empty() {
        let _ = writeln!(out, "**Most-modified columns**:");
        for (column, count) in &summary.top_modified_columns {
            let _ = writeln!(out, "- `{column}`: {count}");
        }
        let _ = writeln!(out);
    }
}

const MAX_SAMPLE_ROWS: usize = 20;

fn render_modified_sample(out: &mut String, data: &crate::model::ComparisonData) {
    if data.modified.is_empty() {
        return;
    }
    let _ = writeln!(out, "## Modified cells (sample)");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Key | Column | Before | After |");
    let _ = writeln!(out, "|---|---|---|---|");
    for cell in data.modified.iter().take(MAX_SAMPLE_ROWS) {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            cell.key, cell.column, cell.value_before, cell.value_after
        );
    }
    if data.modified.len() > MAX_SAMPLE_ROWS {
        let _ = writeln!(out, "\n_{} more not shown._", data.modified.len() - MAX_SAMPLE_ROWS);
    }
    let _ = writeln!(out);
}

/// Render `ctx` with `renderer` and write it to `output_path`, returning the
/// path for the caller to thread into `ComparisonResult.report_path`.
pub fn write_report(
    output_path: &Path,
    renderer: &dyn ReportRenderer,
    ctx: &ReportContext,
) -> anyhow::Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, renderer.render(ctx))?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComparisonResult, Status};

    #[test]
    fn renders_a_status_and_schema_section() {
        let outcome = PairOutcome {
            result: ComparisonResult::new(Status::DifferencesFound),
            schema_diff: SchemaDiff::default(),
            data: None,
            summary: None,
        };
        let ctx = ReportContext {
            relative_path: Path::new("orders.csv"),
            before_path: Path::new("/a/orders.csv"),
            after_path: Path::new("/b/orders.csv"),
            outcome: &outcome,
        };
        let rendered = MarkdownRenderer.render(&ctx);
        assert!(rendered.contains("DIFFERENCES_FOUND"));
        assert!(rendered.contains("Schemas are identical."));
    }
}
