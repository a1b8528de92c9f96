//! dnsdeps Library
//!
//! Large-scale DNS dependency measurement. For a ranked list of domains the
//! pipeline resolves, stage by stage:
//!
//! - domains to their nameservers (NS)
//! - nameservers to an IPv4 address (A)
//! - addresses to origin ASNs (Team Cymru TXT)
//! - ASNs to organization names (Team Cymru TXT)
//!
//! Each stage is a bounded-concurrency batch over one resolver endpoint;
//! per-query failures are counted, never fatal. The persisted mappings are
//! then aggregated into organizational concentration and in-bailiwick
//! figures.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dnsdeps::config::Config;
//! use dnsdeps::pipeline;
//! use dnsdeps::resolver::TrustDnsBackend;
//!
//! # async fn run() -> dnsdeps::Result<()> {
//! let config = Config::from_env();
//! let backend = Arc::new(TrustDnsBackend::new(&config.network));
//! let report = pipeline::resolve_nameservers(backend, &config).await?;
//! println!("failed NS lookups: {}", report.failures);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod netutil;
pub mod pipeline;
pub mod resolver;
pub mod store;
pub mod structured_output;
pub mod styled_output;

// Re-export commonly used types and functions for convenience
pub use analysis::{Analysis, Mappings};
pub use errors::{PipelineError, Result};
pub use pipeline::{StageId, StageReport};
pub use resolver::{Answer, DnsBackend, LookupFailure, RecordKind, ResolverClient};
pub use structured_output::AggregateReport;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
