//! Result command implementation.
//!
//! Retrieve and display the counts of a finished IBM Quantum job.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qrun_adapter_ibm::IbmBackend;
use qrun_hal::{Backend, JobId};

use super::common::{export, print_results};
use crate::config::Config;

/// Execute the result command.
pub async fn execute(
    config: &Config,
    endpoint: Option<&str>,
    job_id: &str,
    json: Option<&Path>,
    svg: Option<&Path>,
) -> Result<()> {
    let credentials = config.ibm_credentials()?;
    let options = config.ibm_options(endpoint, None);

    println!(
        "{} Fetching results for job {}",
        style("→").cyan().bold(),
        style(job_id).dim()
    );

    let backend = IbmBackend::for_job(&credentials, job_id, options)
        .await
        .with_context(|| format!("Failed to look up job {job_id}"))?;
    let result = backend
        .result(&JobId::new(job_id))
        .await
        .with_context(|| format!("Failed to get result of job {job_id}"))?;

    print_results(&result);
    export(&result, json, svg)
}
