//! Backends command implementation.

use anyhow::{Context, Result};
use console::style;

use qrun_adapter_ibm::{BackendInfo, IbmClient};
use qrun_hal::{SelectionCriteria, least_busy};

use super::common::spinner;
use crate::config::Config;

/// List IBM Quantum devices with at least `min_qubits` qubits, shortest
/// queue first, marking the one `run --backend ibm` would pick.
pub async fn execute(config: &Config, endpoint: Option<&str>, min_qubits: u32) -> Result<()> {
    let credentials = config.ibm_credentials()?;
    let options = config.ibm_options(endpoint, None);

    let listing = spinner("Querying IBM Quantum backends...");
    let backends = async {
        let client = IbmClient::connect(&credentials, options.endpoint.as_deref()).await?;
        client.list_backends().await
    }
    .await;
    listing.finish_and_clear();
    let backends = backends.context("Failed to list IBM Quantum backends")?;

    let backends = filter_and_sort(backends, min_qubits);
    if backends.is_empty() {
        println!("No backends with at least {min_qubits} qubits.");
        return Ok(());
    }

    let candidates: Vec<_> = backends.iter().map(BackendInfo::to_candidate).collect();
    let pick = least_busy(&candidates, &SelectionCriteria::hardware(min_qubits))
        .ok()
        .map(|c| c.name);

    println!("{} IBM Quantum backends:\n", style("qrun").cyan().bold());
    for info in &backends {
        let marker = if info.operational {
            style("●").green()
        } else {
            style("○").red()
        };
        let least = if pick.as_deref() == Some(info.name.as_str()) {
            style(" ← least busy").yellow().to_string()
        } else {
            String::new()
        };
        println!("  {marker} {}{least}", style(&info.name).bold());
        println!(
            "    Qubits: {}{}",
            info.num_qubits,
            info.processor
                .as_deref()
                .map(|p| format!(" ({p})"))
                .unwrap_or_default()
        );
        println!(
            "    Status: {}",
            info.status_msg.as_deref().unwrap_or(if info.operational {
                "operational"
            } else {
                "offline"
            })
        );
        println!("    Pending jobs: {}", info.pending_jobs);
        if info.simulator {
            println!("    Simulator");
        }
        println!();
    }
    Ok(())
}

fn filter_and_sort(mut backends: Vec<BackendInfo>, min_qubits: u32) -> Vec<BackendInfo> {
    backends.retain(|b| b.num_qubits >= min_qubits);
    backends.sort_by(|a, b| {
        b.operational
            .cmp(&a.operational)
            .then(a.pending_jobs.cmp(&b.pending_jobs))
            .then_with(|| a.name.cmp(&b.name))
    });
    backends
}
