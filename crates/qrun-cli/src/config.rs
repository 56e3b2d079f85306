//! CLI configuration.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. `~/.qrun/config.yaml`, or the file named by `QRUN_CONFIG` / `--config`
//! 3. Environment variables (`IBM_API_KEY`, `IBM_SERVICE_CRN`, `IBM_QUANTUM_TOKEN`)
//! 4. Command line flags
//!
//! ```yaml
//! shots: 4096
//! backend: ibm
//! ibm:
//!   api_key: "..."
//!   service_crn: "crn:v1:bluemix:public:quantum-computing:..."
//!   device: ibm_torino
//!   optimization_level: 1
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qrun_adapter_ibm::{IbmCredentials, IbmOptions};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "QRUN_CONFIG";

/// Shots per run when neither flag nor file set them.
pub const DEFAULT_SHOTS: u32 = 4096;

/// Where a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Local noiseless simulator
    #[default]
    #[value(alias = "simulator")]
    Sim,
    /// Local simulator with depolarizing and readout noise
    NoisySim,
    /// IBM Quantum hardware
    Ibm,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub shots: Option<u32>,
    pub backend: Option<BackendKind>,
    pub ibm: IbmConfig,
}

/// `ibm:` section.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IbmConfig {
    pub api_key: Option<String>,
    pub service_crn: Option<String>,
    pub token: Option<String>,
    pub endpoint: Option<String>,
    /// Device used instead of least-busy selection.
    pub device: Option<String>,
    pub optimization_level: Option<u8>,
}

impl fmt::Debug for IbmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("IbmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("service_crn", &self.service_crn)
            .field("token", &redact(&self.token))
            .field("endpoint", &self.endpoint)
            .field("device", &self.device)
            .field("optimization_level", &self.optimization_level)
            .finish()
    }
}

impl Config {
    /// Default file location, `~/.qrun/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".qrun").join("config.yaml"))
    }

    /// Load from `path` if given (it must exist), else from the default
    /// location if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse and validate one file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&source)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(source: &str) -> Result<Self> {
        // An empty file is a valid, empty config.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shots == Some(0) {
            anyhow::bail!("shots must be at least 1");
        }
        if let Some(level) = self.ibm.optimization_level {
            if level > 3 {
                anyhow::bail!("ibm.optimization_level must be 0-3, got {level}");
            }
        }
        Ok(())
    }

    pub fn shots(&self, flag: Option<u32>) -> u32 {
        flag.or(self.shots).unwrap_or(DEFAULT_SHOTS)
    }

    pub fn backend(&self, flag: Option<BackendKind>) -> BackendKind {
        flag.or(self.backend).unwrap_or_default()
    }

    /// Device named on the command line or in the file.
    pub fn device(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string).or_else(|| self.ibm.device.clone())
    }

    /// IBM credentials, environment overriding the file.
    pub fn ibm_credentials(&self) -> Result<IbmCredentials> {
        IbmCredentials::from_env_or(
            self.ibm.api_key.clone(),
            self.ibm.service_crn.clone(),
            self.ibm.token.clone(),
        )
        .context("No IBM Quantum credentials")
    }

    pub fn ibm_options(&self, endpoint: Option<&str>, optimization_level: Option<u8>) -> IbmOptions {
        let defaults = IbmOptions::default();
        IbmOptions {
            endpoint: endpoint
                .map(str::to_string)
                .or_else(|| self.ibm.endpoint.clone()),
            optimization_level: optimization_level
                .or(self.ibm.optimization_level)
                .unwrap_or(defaults.optimization_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config = Config::parse(
            r#"
shots: 1024
backend: noisy-sim
ibm:
  token: abc
  device: ibm_torino
  optimization_level: 2
"#,
        )
        .unwrap();
        assert_eq!(config.shots, Some(1024));
        assert_eq!(config.backend, Some(BackendKind::NoisySim));
        assert_eq!(config.ibm.device.as_deref(), Some("ibm_torino"));
        assert_eq!(config.ibm_options(None, None).optimization_level, 2);
    }

    #[test]
    fn test_precedence_flags_over_file_over_defaults() {
        let defaults = Config::default();
        assert_eq!(defaults.shots(None), DEFAULT_SHOTS);
        assert_eq!(defaults.backend(None), BackendKind::Sim);
        assert_eq!(defaults.ibm_options(None, None).optimization_level, 1);

        let config = Config {
            shots: Some(100),
            backend: Some(BackendKind::Ibm),
            ..Config::default()
        };
        assert_eq!(config.shots(None), 100);
        assert_eq!(config.shots(Some(7)), 7);
        assert_eq!(config.backend(Some(BackendKind::Sim)), BackendKind::Sim);
        assert_eq!(
            config.ibm_options(Some("https://x"), Some(3)),
            IbmOptions {
                endpoint: Some("https://x".into()),
                optimization_level: 3
            }
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::parse("shots: 0").is_err());
        assert!(Config::parse("ibm:\n  optimization_level: 5").is_err());
        assert!(Config::parse("backend: quantum-annealer").is_err());
        assert!(Config::parse("shotz: 10").is_err());
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::parse("ibm:\n  api_key: very-secret\n  service_crn: crn:v1:x").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("crn:v1:x"));
    }
}
