//! Result aggregation over the four persisted mappings.
//!
//! A domain depends on the set of organizations reachable through
//! NS -> IP -> ASN list -> org. Missing links and null organizations are
//! skipped. From that set:
//!   * "unreachable": the domain depends on exactly one organization, which
//!     could make it unresolvable on its own
//!   * "affected": the organization appears in the domain's set at all

use std::collections::{BTreeSet, HashMap};

use crate::config::PathConfig;
use crate::errors::Result;
use crate::netutil::is_in_bailiwick;
use crate::store::{self, AsnMap, IpMap, NameserverSet, OrgMap};

/// Number of organizations in the top lists.
pub const TOP_N: usize = 10;

/// The four mappings, loaded.
#[derive(Debug, Clone, Default)]
pub struct Mappings {
    pub nameservers: NameserverSet,
    pub addresses: IpMap,
    pub asns: AsnMap,
    pub organizations: OrgMap,
}

/// Aggregated figures, ready for serialization and presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub total_domains: usize,
    pub inbailwick_percent: f64,
    pub inbailwick_partial_percent: f64,
    pub top_unreachable_numbers: Vec<(String, usize)>,
    pub top_unreachable_percents: Vec<(String, f64)>,
    pub top_affected_numbers: Vec<(String, usize)>,
    pub top_affected_percents: Vec<(String, f64)>,
}

/// Per-organization domain counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgCounts {
    pub unreachable: HashMap<String, usize>,
    pub affected: HashMap<String, usize>,
}

/// Domains whose nameservers are all / only some in-bailiwick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bailiwick {
    pub full: Vec<String>,
    pub partial: Vec<String>,
}

impl Mappings {
    /// Load all four mappings; any missing file is fatal.
    pub fn load(paths: &PathConfig) -> Result<Self> {
        Ok(Self {
            nameservers: store::read_mapping(&paths.nameservers())?,
            addresses: store::read_mapping(&paths.nameserver_ips())?,
            asns: store::read_mapping(&paths.ip_asns())?,
            organizations: store::read_mapping(&paths.asn_orgs())?,
        })
    }

    /// Organizations a domain's nameservers depend on.
    pub fn organizations_for(&self, nameservers: &[String]) -> BTreeSet<&str> {
        nameservers
            .iter()
            .filter_map(|ns| self.addresses.get(ns))
            .filter_map(|ip| self.asns.get(ip))
            .flatten()
            .filter_map(|asn| self.organizations.get(asn))
            .filter_map(|org| org.as_deref())
            .collect()
    }

    pub fn org_counts(&self) -> OrgCounts {
        let mut counts = OrgCounts::default();
        for nameservers in self.nameservers.values() {
            let orgs = self.organizations_for(nameservers);
            if orgs.len() == 1
                && let Some(only) = orgs.first()
            {
                *counts.unreachable.entry(only.to_string()).or_default() += 1;
            }
            for org in orgs {
                *counts.affected.entry(org.to_string()).or_default() += 1;
            }
        }
        counts
    }

    pub fn bailiwick(&self) -> Bailiwick {
        let mut result = Bailiwick::default();
        for (domain, nameservers) in &self.nameservers {
            let inside = nameservers
                .iter()
                .filter(|ns| is_in_bailiwick(ns, domain))
                .count();
            if inside > 0 && inside == nameservers.len() {
                result.full.push(domain.clone());
            } else if inside > 0 {
                result.partial.push(domain.clone());
            }
        }
        result
    }

    pub fn analyze(&self) -> Analysis {
        let total = self.nameservers.len();
        let counts = self.org_counts();
        let bailiwick = self.bailiwick();

        let top_unreachable_numbers = top_n(&counts.unreachable, TOP_N);
        let top_affected_numbers: Vec<(String, usize)> = top_unreachable_numbers
            .iter()
            .map(|(org, _)| (org.clone(), counts.affected.get(org).copied().unwrap_or(0)))
            .collect();

        Analysis {
            total_domains: total,
            inbailwick_percent: percent(bailiwick.full.len(), total, 2),
            inbailwick_partial_percent: percent(bailiwick.partial.len(), total, 2),
            top_unreachable_percents: as_percents(&top_unreachable_numbers, total),
            top_affected_percents: as_percents(&top_affected_numbers, total),
            top_unreachable_numbers,
            top_affected_numbers,
        }
    }
}

/// Highest counts first; ties by name so output is stable.
pub fn top_n(counts: &HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

/// `part / total * 100`, rounded to `decimals`; zero when `total` is zero.
pub fn percent(part: usize, total: usize, decimals: i32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let scale = 10f64.powi(decimals);
    ((part as f64 / total as f64) * 100.0 * scale).round() / scale
}

fn as_percents(numbers: &[(String, usize)], total: usize) -> Vec<(String, f64)> {
    numbers
        .iter()
        .map(|(org, count)| (org.clone(), percent(*count, total, 1)))
        .collect()
}
