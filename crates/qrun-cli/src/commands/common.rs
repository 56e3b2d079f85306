//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use qrun_hal::{Backend, ExecutionResult, JobId, WaitOptions};
use qrun_ir::Circuit;

use crate::histogram;

/// The superposition and entanglement program every `run` executes.
pub fn program_circuit() -> Result<Circuit> {
    Circuit::superposition_entanglement().context("Failed to build circuit")
}

/// Polling used for cloud jobs: every 5 s for up to a day.
pub fn cloud_wait_options() -> WaitOptions {
    WaitOptions::default()
        .with_poll_interval(Duration::from_secs(5))
        .with_max_polls(17_280)
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Wait for `job_id` to finish behind a spinner.
pub async fn wait_with_spinner(
    backend: &dyn Backend,
    job_id: &JobId,
    options: WaitOptions,
) -> Result<ExecutionResult> {
    let spinner = spinner(format!("Waiting for job {job_id}..."));
    let outcome = backend.wait_with(job_id, options).await;
    spinner.finish_and_clear();
    outcome.with_context(|| format!("Job {job_id} did not complete"))
}

/// Print `Results: {...}` followed by the histogram.
pub fn print_results(result: &ExecutionResult) {
    println!("Results: {}", result.counts);
    println!();

    let lines = histogram::render_text(&result.counts);
    let bars = histogram::bars(&result.counts);
    for (line, bar) in lines.iter().zip(&bars) {
        // Color only the bitstring; the rest is already aligned.
        let rest = &line[bar.bitstring.len()..];
        println!("  {}{}", style(bar.bitstring).cyan(), style(rest).green());
    }

    let mut footer = format!("{} shots", result.counts.total_shots());
    if let Some(backend) = &result.backend {
        footer.push_str(&format!(" on {backend}"));
    }
    if let Some(ms) = result.execution_time_ms {
        footer.push_str(&format!(" in {ms} ms"));
    }
    println!("\n  {}", style(footer).dim());
}

/// Write the result as pretty JSON.
pub fn write_json(path: &Path, result: &ExecutionResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("JSON serialization failed")?;
    fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the histogram as an SVG file.
pub fn write_svg(path: &Path, result: &ExecutionResult) -> Result<()> {
    let title = match &result.backend {
        Some(backend) => format!("Counts on {backend} ({} shots)", result.counts.total_shots()),
        None => format!("Counts ({} shots)", result.counts.total_shots()),
    };
    fs::write(path, histogram::render_svg(&result.counts, &title))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write whichever exports were requested and say where they went.
pub fn export(result: &ExecutionResult, json: Option<&Path>, svg: Option<&Path>) -> Result<()> {
    if let Some(path) = json {
        write_json(path, result)?;
        println!("{} Counts written to {}", style("✓").green(), path.display());
    }
    if let Some(path) = svg {
        write_svg(path, result)?;
        println!("{} Histogram written to {}", style("✓").green(), path.display());
    }
    Ok(())
}
