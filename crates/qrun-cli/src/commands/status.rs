//! Status command implementation.

use anyhow::{Context, Result};
use console::style;

use qrun_adapter_ibm::IbmClient;
use qrun_hal::JobStatus;

use crate::config::Config;

/// Show the status of an IBM Quantum job.
pub async fn execute(config: &Config, endpoint: Option<&str>, job_id: &str) -> Result<()> {
    let credentials = config.ibm_credentials()?;
    let options = config.ibm_options(endpoint, None);
    let client = IbmClient::connect(&credentials, options.endpoint.as_deref())
        .await
        .context("Failed to connect to IBM Quantum")?;

    let job = client
        .get_job_status(job_id)
        .await
        .with_context(|| format!("Failed to get status of job {job_id}"))?;
    let status = job.to_job_status();

    println!(">>> Job ID: {}", job.id);
    println!(">>> Job Status: {}", styled(&status));
    if let Some(backend) = &job.backend {
        println!("    Backend: {backend}");
    }
    if let Some(created) = job.created_at() {
        println!("    Created: {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let JobStatus::Failed(reason) = &status {
        println!("    Reason: {reason}");
    }
    if status.is_success() {
        println!(
            "{} Fetch the result with {}",
            style("→").cyan().bold(),
            style(format!("qrun result {job_id}")).yellow()
        );
    }
    Ok(())
}

fn styled(status: &JobStatus) -> console::StyledObject<&'static str> {
    let name = status.name();
    match status {
        JobStatus::Completed => style(name).green(),
        JobStatus::Failed(_) | JobStatus::Cancelled => style(name).red(),
        JobStatus::Queued | JobStatus::Running => style(name).yellow(),
    }
}
