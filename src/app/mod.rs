//! High-level application orchestration layer.
//!
//! This module provides the CLI-facing `App` façade. Major steps in
//! `App::run`:
//!   1. Schema generation early-exit
//!   2. Config load / validation (a bad value is a `Configuration` error)
//!   3. The four resolution stages, strictly in sequence (unless
//!      `--skip-resolution`)
//!   4. Aggregation over the persisted mappings, written to `results.json`
//!   5. Structured (JSON/YAML) or styled/plain rendering
//!
//! Stage progress is user-visible output. It goes to stdout, or to stderr
//! when stdout carries a structured document.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::analysis::Mappings;
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::errors::{PipelineError, Result};
use crate::pipeline::{self, StageId, StageReport};
use crate::resolver::TrustDnsBackend;
use crate::structured_output::AggregateReport;
use crate::styled_output::StyledFormatter;

/// Application façade.
pub struct App;

impl App {
    /// Execute the end-to-end measurement workflow.
    ///
    /// Configuration problems and missing inputs come back as `PipelineError`;
    /// per-query failures never do.
    pub async fn run(cli: &Cli) -> Result<()> {
        if Self::maybe_print_schema(cli)? {
            return Ok(());
        }
        let config = Self::load_config(cli)?;

        let start_overall = Instant::now();

        if !cli.skip_resolution {
            Self::run_stages(cli, &config).await?;
            Self::progress(
                cli,
                "Data Collection Complete. Processing Data and creating graphics.",
            );
        }

        let report = Self::aggregate(&config)?;
        Self::render(cli, &report)?;

        Self::progress(
            cli,
            &format!(
                "Total time to run entire research: {:.2} seconds",
                start_overall.elapsed().as_secs_f64()
            ),
        );
        Ok(())
    }

    async fn run_stages(cli: &Cli, config: &Config) -> Result<Vec<StageReport>> {
        let backend = Arc::new(TrustDnsBackend::new(&config.network));
        info!(
            resolver = %backend.endpoint(),
            workers = config.pipeline.max_concurrency,
            records = config.pipeline.record_limit,
            "starting resolution stages"
        );

        pipeline::run_all(backend, config, |stage, report| match report {
            None => Self::progress(cli, &format!("Begin {stage}")),
            Some(report) => Self::progress(cli, &Self::completion_line(stage, report)),
        })
        .await
    }

    /// `Completed Step 2 - Total Time: 1.23 seconds. Failed A Resolutions: 4`
    pub fn completion_line(stage: StageId, report: &StageReport) -> String {
        let mut line = format!(
            "Completed Step {} - Total Time: {:.2} seconds. Failed {} Resolutions: {}",
            stage.step(),
            report.elapsed.as_secs_f64(),
            stage.record(),
            report.failures
        );
        if report.malformed > 0 {
            line.push_str(&format!(". Malformed Responses: {}", report.malformed));
        }
        line
    }

    fn aggregate(config: &Config) -> Result<AggregateReport> {
        let mappings = Mappings::load(&config.paths)?;
        let analysis = mappings.analyze();
        let report = AggregateReport::from_analysis(&analysis);
        report.write(&config.paths.results())?;
        info!(
            domains = analysis.total_domains,
            path = %config.paths.results().display(),
            "wrote aggregated results"
        );
        Ok(report)
    }

    fn progress(cli: &Cli, line: &str) {
        if cli.is_structured_output() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

/// Rendering
impl App {
    fn render(cli: &Cli, report: &AggregateReport) -> Result<()> {
        let rendered = match cli.format {
            OutputFormat::Json => report.to_json(),
            OutputFormat::Yaml => report.to_yaml(),
            OutputFormat::Text | OutputFormat::Plain => {
                let formatter = if cli.should_use_styling() {
                    StyledFormatter::new()
                } else {
                    StyledFormatter::without_colors()
                };
                return formatter.print_report(report).map_err(|e| {
                    PipelineError::internal(format!("Output formatting failed: {e}"))
                });
            }
        };

        match rendered {
            Ok(text) => {
                println!("{text}");
                Ok(())
            }
            Err(e) => Err(PipelineError::internal(format!(
                "Error formatting structured output: {e}"
            ))),
        }
    }
}

/// Helper: schema generation early-exit and configuration
impl App {
    fn maybe_print_schema(cli: &Cli) -> Result<bool> {
        if cli.generate_schema {
            let schema = AggregateReport::generate_json_schema().map_err(|e| {
                PipelineError::internal(format!("Error generating JSON schema: {e}"))
            })?;
            println!("{schema}");
            return Ok(true);
        }
        Ok(false)
    }

    fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = Config::from_env();
        config.merge_with_cli(cli);
        config
            .validate()
            .map_err(|e| PipelineError::configuration(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn invalid_configuration_is_an_input_error() {
        let cli = Cli::parse_from(["dnsdeps", "--threads", "0"]);
        let err = App::load_config(&cli).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration { .. }));
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.to_string().contains("pipeline.max_concurrency"));
    }

    #[test]
    fn completion_line_wording() {
        let report = StageReport {
            stage: StageId::Addresses,
            queries: 10,
            entries: 6,
            failures: 4,
            malformed: 0,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            App::completion_line(StageId::Addresses, &report),
            "Completed Step 2 - Total Time: 1.50 seconds. Failed A Resolutions: 4"
        );

        let report = StageReport {
            stage: StageId::Asns,
            malformed: 2,
            ..report
        };
        assert!(
            App::completion_line(StageId::Asns, &report)
                .ends_with("Failed TXT Resolutions: 4. Malformed Responses: 2")
        );
    }
}
