//! Configuration management for dnsdeps.
//!
//! Values are layered: built-in defaults, then `DNSDEPS_*` environment
//! variables, then command-line flags. Every component receives its settings
//! explicitly from here; nothing reads process-wide state on its own.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::store::{
    ASN_ORGS_FILE, DOMAIN_NAMESERVERS_FILE, IP_ASNS_FILE, NAMESERVER_IPS_FILE, RESULTS_FILE,
};

/// Upper bound accepted for the per-query timeout.
pub const MAX_DNS_TIMEOUT: Duration = Duration::from_secs(300);

/// Main configuration structure for dnsdeps.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Resolver endpoint settings
    pub network: NetworkConfig,

    /// Stage execution settings
    pub pipeline: PipelineConfig,

    /// Input and output locations
    pub paths: PathConfig,
}

/// Resolver endpoint. Constant across all stages.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Address of the (local, controlled) resolver
    pub resolver_addr: IpAddr,

    /// Port of the resolver
    pub resolver_port: u16,

    /// Per-query timeout; the only bound on a stuck query
    pub dns_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of ranked-list rows read for stage 1
    pub record_limit: usize,

    /// Maximum queries in flight within one stage
    pub max_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Ranked domain list
    pub input: PathBuf,

    /// Directory holding every stage mapping and the results file
    pub output_dir: PathBuf,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            resolver_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            resolver_port: 8053,
            dns_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            record_limit: 10_000,
            max_concurrency: 25,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("outputs/top-1m.csv"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl NetworkConfig {
    pub fn endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.resolver_addr, self.resolver_port)
    }
}

impl PathConfig {
    fn in_output_dir(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn nameservers(&self) -> PathBuf {
        self.in_output_dir(DOMAIN_NAMESERVERS_FILE)
    }

    pub fn nameserver_ips(&self) -> PathBuf {
        self.in_output_dir(NAMESERVER_IPS_FILE)
    }

    pub fn ip_asns(&self) -> PathBuf {
        self.in_output_dir(IP_ASNS_FILE)
    }

    pub fn asn_orgs(&self) -> PathBuf {
        self.in_output_dir(ASN_ORGS_FILE)
    }

    pub fn results(&self) -> PathBuf {
        self.in_output_dir(RESULTS_FILE)
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DNSDEPS_RESOLVER_ADDR")
            && let Ok(ip) = addr.parse::<IpAddr>()
        {
            config.network.resolver_addr = ip;
        }

        if let Ok(port) = std::env::var("DNSDEPS_RESOLVER_PORT")
            && let Ok(p) = port.parse::<u16>()
        {
            config.network.resolver_port = p;
        }

        if let Ok(timeout) = std::env::var("DNSDEPS_DNS_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse::<u64>()
        {
            config.network.dns_timeout = Duration::from_secs(secs);
        }

        if let Ok(limit) = std::env::var("DNSDEPS_RECORD_LIMIT")
            && let Ok(n) = limit.parse::<usize>()
        {
            config.pipeline.record_limit = n;
        }

        if let Ok(workers) = std::env::var("DNSDEPS_MAX_CONCURRENCY")
            && let Ok(n) = workers.parse::<usize>()
        {
            config.pipeline.max_concurrency = n;
        }

        if let Ok(input) = std::env::var("DNSDEPS_INPUT") {
            config.paths.input = PathBuf::from(input);
        }

        if let Ok(dir) = std::env::var("DNSDEPS_OUTPUT_DIR") {
            config.paths.output_dir = PathBuf::from(dir);
        }

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(records) = cli.records {
            self.pipeline.record_limit = records;
        }
        if let Some(threads) = cli.threads {
            self.pipeline.max_concurrency = threads;
        }

        if let Some(ref input) = cli.input {
            self.paths.input = input.clone();
        }
        if let Some(ref dir) = cli.output_dir {
            self.paths.output_dir = dir.clone();
        }
        if let Some(addr) = cli.resolver {
            self.network.resolver_addr = addr;
        }
        if let Some(port) = cli.port {
            self.network.resolver_port = port;
        }
        if let Some(secs) = cli.timeout {
            self.network.dns_timeout = Duration::from_secs(secs);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.dns_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "network.dns_timeout",
                "0",
                "Timeout must be greater than 0",
            ));
        }

        if self.network.dns_timeout > MAX_DNS_TIMEOUT {
            return Err(ConfigError::invalid(
                "network.dns_timeout",
                &self.network.dns_timeout.as_secs().to_string(),
                &format!("Timeout must be at most {}s", MAX_DNS_TIMEOUT.as_secs()),
            ));
        }

        if self.network.resolver_port == 0 {
            return Err(ConfigError::invalid(
                "network.resolver_port",
                "0",
                "Resolver port must be non-zero",
            ));
        }

        if self.pipeline.max_concurrency == 0 {
            return Err(ConfigError::invalid(
                "pipeline.max_concurrency",
                "0",
                "At least one query must be allowed in flight",
            ));
        }

        if self.pipeline.record_limit == 0 {
            return Err(ConfigError::invalid(
                "pipeline.record_limit",
                "0",
                "Record limit must be at least 1",
            ));
        }

        if self.paths.output_dir == Path::new("") {
            return Err(ConfigError::MissingRequired {
                field: "paths.output_dir".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },
}

impl ConfigError {
    fn invalid(field: &str, value: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.endpoint(), "127.0.0.1:8053".parse().unwrap());
        assert_eq!(config.network.dns_timeout, Duration::from_secs(5));
        assert_eq!(config.pipeline.record_limit, 10_000);
        assert_eq!(config.pipeline.max_concurrency, 25);
        assert_eq!(
            config.paths.nameservers(),
            PathBuf::from("outputs/domains_nameservers.json")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.pipeline.max_concurrency = 0;
        assert!(config.validate().is_err());

        config.pipeline.max_concurrency = 25;
        config.network.dns_timeout = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("network.dns_timeout"));
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        let cli = crate::cli::Cli::parse_from(["dnsdeps", "--timeout", "18446744073709551615"]);
        let mut config = Config::default();
        config.merge_with_cli(&cli);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most 300s"));

        config.network.dns_timeout = MAX_DNS_TIMEOUT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_loading() {
        unsafe {
            env::set_var("DNSDEPS_RESOLVER_PORT", "5353");
            env::set_var("DNSDEPS_MAX_CONCURRENCY", "100");
            env::set_var("DNSDEPS_OUTPUT_DIR", "/tmp/dnsdeps-out");
        }

        let config = Config::from_env();
        assert_eq!(config.network.resolver_port, 5353);
        assert_eq!(config.pipeline.max_concurrency, 100);
        assert_eq!(
            config.paths.results(),
            PathBuf::from("/tmp/dnsdeps-out/results.json")
        );

        unsafe {
            env::remove_var("DNSDEPS_RESOLVER_PORT");
            env::remove_var("DNSDEPS_MAX_CONCURRENCY");
            env::remove_var("DNSDEPS_OUTPUT_DIR");
        }
    }

    #[test]
    fn test_cli_takes_precedence() {
        let cli = crate::cli::Cli::parse_from([
            "dnsdeps",
            "--records",
            "10",
            "--threads",
            "4",
            "--resolver",
            "10.0.0.53",
            "--port",
            "53",
            "--output-dir",
            "run1",
        ]);
        let mut config = Config::default();
        config.merge_with_cli(&cli);
        assert_eq!(config.pipeline.record_limit, 10);
        assert_eq!(config.pipeline.max_concurrency, 4);
        assert_eq!(config.network.endpoint(), "10.0.0.53:53".parse().unwrap());
        assert_eq!(config.paths.asn_orgs(), PathBuf::from("run1/asn_to_org_mapping.json"));
    }
}
