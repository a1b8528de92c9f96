//! Durable storage for stage inputs and outputs.
//!
//! Every stage mapping is one pretty-printed JSON object per file, written
//! whole (no incremental merge). Mappings are `BTreeMap`s so keys come out
//! sorted and identical inputs give byte-identical files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::errors::{IoResultExt, PipelineError, Result};

pub const DOMAIN_NAMESERVERS_FILE: &str = "domains_nameservers.json";
pub const NAMESERVER_IPS_FILE: &str = "nameserver_ips.json";
pub const IP_ASNS_FILE: &str = "ip_to_asn_mapping.json";
pub const ASN_ORGS_FILE: &str = "asn_to_org_mapping.json";
pub const RESULTS_FILE: &str = "results.json";

/// Domain -> nameservers, in DNS response order.
pub type NameserverSet = BTreeMap<String, Vec<String>>;

/// Nameserver -> first IPv4 address. Failed lookups are absent.
pub type IpMap = BTreeMap<String, String>;

/// IP -> announcing ASNs.
pub type AsnMap = BTreeMap<String, Vec<String>>;

/// ASN -> organization. Failed lookups keep the key with `None`.
pub type OrgMap = BTreeMap<String, Option<String>>;

/// Read up to `limit` domains from a comma-delimited ranked list.
///
/// The domain is the second field of each row. Blank lines are skipped and
/// do not count against the limit.
pub fn read_ranked_domains(path: &Path, limit: usize) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).with_path(path, "read")?;
    let mut domains = Vec::with_capacity(limit.min(content.len() / 8 + 1));

    for (idx, line) in content.lines().enumerate() {
        if domains.len() >= limit {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split(',').nth(1).map(str::trim) {
            Some(domain) if !domain.is_empty() => domains.push(domain.to_string()),
            _ => {
                return Err(PipelineError::input_format(
                    path,
                    idx + 1,
                    "expected a domain in the second column",
                ));
            }
        }
    }

    debug!(path = %path.display(), count = domains.len(), "read ranked list");
    Ok(domains)
}

/// Read a prior stage's mapping. A missing file is fatal for the caller.
pub fn read_mapping<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_path(path, "read")?;
    serde_json::from_str(&content).map_err(|e| PipelineError::json(path, e))
}

/// Serialize a value the way every output file is written: four-space indent.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write a mapping, replacing any previous run's file.
pub fn write_mapping<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    let bytes = to_pretty_json(value).map_err(|e| PipelineError::json(path, e))?;
    fs::write(path, bytes).with_path(path, "write")?;
    debug!(path = %path.display(), "wrote mapping");
    Ok(())
}
