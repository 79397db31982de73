//! Terminal summary of an analysis run

use crate::pipeline::AnalysisReport;
use colored::*;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const TOP_IMPORTANCES: usize = 5;
const BAR_WIDTH: usize = 24;

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

/// Horizontal bar of `value` in [0, 1]
fn importance_bar(value: f64) -> String {
    let filled = (value.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

// ─── Summary ───────────────────────────────────────────────────────────────────

/// Print the run summary to stdout
pub fn print_summary(report: &AnalysisReport) {
    section("Decision tree");
    kv("Rows", &report.n_rows.to_string());
    kv("Features", &report.feature_names.len().to_string());
    kv("Depth", &report.tree_depth.to_string());
    kv("Leaves", &report.n_leaves.to_string());
    kv("R²", &format!("{:.4}", report.metrics.r2));
    kv("RMSE", &format!("{:.2}", report.metrics.rmse));
    kv("MAE", &format!("{:.2}", report.metrics.mae));

    section("Feature importance");
    let top = report.importances.top_k(TOP_IMPORTANCES);
    let name_width = top.iter().map(|e| e.feature_name.len()).max().unwrap_or(0);
    for entry in top {
        println!(
            "  {:<width$}  {} {}",
            entry.feature_name,
            accent(&importance_bar(entry.importance)),
            format!("{:.3}", entry.importance).white(),
            width = name_width
        );
    }

    section("Output");
    println!("  {} {}", ok("✓"), report.tree_plot_path.display());
    println!("  {} {}", ok("✓"), report.importance_plot_path.display());
    println!("  {}", dim(&format!("finished in {:.2}s", report.elapsed_secs)));
    println!();
}
