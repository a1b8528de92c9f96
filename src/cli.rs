use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line interface definition.
/// Runs the four resolution stages, aggregates the mappings and renders a summary.
///
/// Verbosity levels:
/// 0 - silent (only stage progress and final output)
/// 1 - errors (default)
/// 2 - warnings + errors
/// 3 - info
/// 5 - trace/debug
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Measure which organizations the nameservers of a ranked domain list depend on"
)]
pub struct Cli {
    /// Number of ranked-list records to use [default: 10000]
    #[arg(short = 'r', long = "records", value_name = "N")]
    pub records: Option<usize>,

    /// Maximum number of DNS queries in flight per stage [default: 25]
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Ranked domain list (comma-delimited, domain in the second column)
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory the stage mappings and results are written to
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Address of the resolver every query is sent to
    #[arg(long, value_name = "IP")]
    pub resolver: Option<IpAddr>,

    /// Port of the resolver
    #[arg(long)]
    pub port: Option<u16>,

    /// Per-query timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Verbosity level (0,1,2,3,5)
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,

    /// Summary rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Skip the resolution stages and aggregate the mappings already on disk
    #[arg(long)]
    pub skip_resolution: bool,

    /// Print the JSON schema of the results file and exit
    #[arg(long)]
    pub generate_schema: bool,
}

/// How the aggregated summary is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Styled terminal tables
    Text,
    /// Tables without ANSI styling
    Plain,
    Json,
    Yaml,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Are error-level messages enabled?
    pub fn error_enabled(&self) -> bool {
        self.verbose >= 1
    }

    pub fn is_structured_output(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }

    pub fn should_use_styling(&self) -> bool {
        self.format == OutputFormat::Text && !self.no_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::parse_from(["dnsdeps"]);
        assert_eq!(cli.records, None);
        assert_eq!(cli.threads, None);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.skip_resolution);
        assert!(cli.error_enabled());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::parse_from(["dnsdeps", "-r", "500", "-t", "64", "--format", "json"]);
        assert_eq!(cli.records, Some(500));
        assert_eq!(cli.threads, Some(64));
        assert!(cli.is_structured_output());
        assert!(!cli.should_use_styling());
    }
}
