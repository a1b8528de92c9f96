//! Structured output for the aggregated results.
//!
//! `AggregateReport` is what gets written to `results.json`. The top-level
//! result keys match the files consumed by the existing charting scripts;
//! each top list is an array of `[organization, value]` pairs.

use std::path::Path;

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::store;

/// Root structure of `results.json`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct AggregateReport {
    /// Tool version and run metadata
    pub metadata: ReportMetadata,

    /// Percentage of domains whose nameservers are all in-bailiwick
    pub inbailwick_result: f64,

    /// Percentage of domains with some, but not all, nameservers in-bailiwick
    pub inbailwick_partial_percent: f64,

    /// Top organizations by sole-dependency domain share, in percent
    pub top_unreachable_percents: Vec<(String, f64)>,

    /// Top organizations by sole-dependency domain count
    pub top_unreachable_numbers: Vec<(String, usize)>,

    /// The same organizations by any-dependency domain share, in percent
    pub top_affected_percents: Vec<(String, f64)>,

    /// The same organizations by any-dependency domain count
    pub top_affected_numbers: Vec<(String, usize)>,
}

/// Tool metadata and versioning information
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ReportMetadata {
    pub tool_name: String,

    pub version: String,

    /// Timestamp when the aggregation was performed
    pub generated_at: chrono::DateTime<chrono::Utc>,

    /// Domains with at least one resolved nameserver (the percentage base)
    pub total_domains: usize,
}

impl AggregateReport {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self {
            metadata: ReportMetadata {
                tool_name: crate::NAME.to_string(),
                version: crate::VERSION.to_string(),
                generated_at: chrono::Utc::now(),
                total_domains: analysis.total_domains,
            },
            inbailwick_result: analysis.inbailwick_percent,
            inbailwick_partial_percent: analysis.inbailwick_partial_percent,
            top_unreachable_percents: analysis.top_unreachable_percents.clone(),
            top_unreachable_numbers: analysis.top_unreachable_numbers.clone(),
            top_affected_percents: analysis.top_affected_percents.clone(),
            top_affected_numbers: analysis.top_affected_numbers.clone(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        let bytes = store::to_pretty_json(self)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write `results.json`, replacing any previous file.
    pub fn write(&self, path: &Path) -> crate::errors::Result<()> {
        store::write_mapping(path, self)
    }

    /// Generate JSON schema for the report
    pub fn generate_json_schema() -> Result<String> {
        let schema = schemars::schema_for!(AggregateReport);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> Analysis {
        Analysis {
            total_domains: 4,
            inbailwick_percent: 25.0,
            inbailwick_partial_percent: 12.5,
            top_unreachable_numbers: vec![("GOOGLE, US".into(), 2)],
            top_unreachable_percents: vec![("GOOGLE, US".into(), 50.0)],
            top_affected_numbers: vec![("GOOGLE, US".into(), 3)],
            top_affected_percents: vec![("GOOGLE, US".into(), 75.0)],
        }
    }

    #[test]
    fn json_uses_result_keys_and_pairs() {
        let json = AggregateReport::from_analysis(&analysis()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["inbailwick_result"], 25.0);
        assert_eq!(value["inbailwick_partial_percent"], 12.5);
        assert_eq!(value["top_unreachable_numbers"][0][0], "GOOGLE, US");
        assert_eq!(value["top_unreachable_numbers"][0][1], 2);
        assert_eq!(value["top_affected_percents"][0][1], 75.0);
        assert_eq!(value["metadata"]["total_domains"], 4);
    }

    #[test]
    fn yaml_output() {
        let yaml = AggregateReport::from_analysis(&analysis()).to_yaml().unwrap();
        assert!(yaml.contains("inbailwick_result: 25.0"));
        assert!(yaml.contains("GOOGLE, US"));
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let report = AggregateReport::from_analysis(&analysis());
        report.write(&path).unwrap();
        let back: AggregateReport = store::read_mapping(&path).unwrap();
        assert_eq!(back.top_affected_numbers, report.top_affected_numbers);
        assert_eq!(back.metadata.generated_at, report.metadata.generated_at);
    }

    #[test]
    fn schema_mentions_result_keys() {
        let schema = AggregateReport::generate_json_schema().unwrap();
        assert!(schema.contains("top_unreachable_percents"));
        assert!(schema.contains("generated_at"));
    }
}
