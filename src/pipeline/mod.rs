//! Bulk query execution and the generic stage runner.
//!
//! Every stage has the same shape:
//!   1. derive keys from the previous stage's mapping
//!   2. build one query per key (`Stage::build_query`)
//!   3. run all queries through [`execute`] under a concurrency budget
//!   4. parse each answer (`Stage::parse`) and zip it back onto its key
//!   5. apply the stage's failure policy and persist the mapping
//!
//! Stages differ only in the record kind and the builder/parser pair, so a
//! stage is a plain value holding two function pointers rather than a type
//! hierarchy. The four concrete stages live in [`stages`].

pub mod stages;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::warn;

use crate::resolver::{Answer, DnsBackend, RecordKind, Resolution, ResolverClient};

pub use stages::{
    resolve_addresses, resolve_asns, resolve_nameservers, resolve_organizations, run_all,
};

/// Run every query once, at most `budget` in flight, results in input order.
///
/// A failing query only affects its own slot. The call returns once every
/// query has finished; there is no early return of partial results.
pub async fn execute<B: DnsBackend>(
    client: &ResolverClient<B>,
    queries: &[String],
    budget: usize,
) -> Vec<Resolution> {
    stream::iter(queries)
        .map(|query| client.resolve(query))
        .buffered(budget.max(1))
        .collect()
        .await
}

/// An answer whose text did not have the expected layout.
///
/// This points at a parser/format mismatch, not a network condition, so it
/// is reported separately from lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
}

impl MalformedResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Which of the four stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Nameservers,
    Addresses,
    Asns,
    Organizations,
}

impl StageId {
    pub const ALL: [StageId; 4] = [
        StageId::Nameservers,
        StageId::Addresses,
        StageId::Asns,
        StageId::Organizations,
    ];

    /// Step number shown to the user.
    pub fn step(self) -> u8 {
        match self {
            StageId::Nameservers => 1,
            StageId::Addresses => 2,
            StageId::Asns => 3,
            StageId::Organizations => 4,
        }
    }

    pub fn record(self) -> RecordKind {
        match self {
            StageId::Nameservers => RecordKind::Ns,
            StageId::Addresses => RecordKind::A,
            StageId::Asns | StageId::Organizations => RecordKind::Txt,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StageId::Nameservers => "Nameserver Resolution",
            StageId::Addresses => "IP Resolution for Nameservers",
            StageId::Asns => "ASN Resolution for IPs",
            StageId::Organizations => "AS Org Resolution for ASNs",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.step(), self.description())
    }
}

/// Query construction and answer parsing for one stage.
pub struct Stage<V> {
    pub id: StageId,
    pub build_query: fn(&str) -> String,
    pub parse: fn(Answer) -> Result<V, MalformedResponse>,
}

/// Raw outcome of a stage's batch, before the failure policy is applied.
#[derive(Debug)]
pub struct StageRun<V> {
    /// One entry per key, in key order; `None` when the lookup failed or
    /// the answer was malformed.
    pub entries: Vec<(String, Option<V>)>,
    pub queries: usize,
    pub failures: usize,
    pub malformed: usize,
}

impl<V> Stage<V> {
    /// Query every key once through a fresh resolver client.
    pub async fn run<B: DnsBackend>(
        &self,
        backend: B,
        keys: Vec<String>,
        budget: usize,
    ) -> StageRun<V> {
        let client = ResolverClient::new(backend, self.id.record());
        let queries: Vec<String> = keys.iter().map(|k| (self.build_query)(k)).collect();

        let results = execute(&client, &queries, budget).await;

        let mut malformed = 0;
        let entries = keys
            .into_iter()
            .zip(queries.iter())
            .zip(results)
            .map(|((key, query), result)| {
                let value = match result {
                    Ok(answer) => match (self.parse)(answer) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            malformed += 1;
                            warn!(stage = self.id.step(), query = %query, "{e}");
                            None
                        }
                    },
                    Err(_) => None,
                };
                (key, value)
            })
            .collect();

        StageRun {
            entries,
            queries: queries.len(),
            failures: client.failures(),
            malformed,
        }
    }
}

impl<V> StageRun<V> {
    /// Failure means omission: keys without a value are dropped.
    pub fn dropping_failures(self) -> BTreeMap<String, V> {
        self.entries
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect()
    }

    /// Every key is kept; failures become `None`.
    pub fn keeping_failures(self) -> BTreeMap<String, Option<V>> {
        self.entries.into_iter().collect()
    }
}

/// Summary a stage hands back to the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: StageId,
    pub queries: usize,
    /// Keys in the persisted mapping.
    pub entries: usize,
    /// Lookups that failed at the resolver.
    pub failures: usize,
    /// Answers that resolved but could not be parsed.
    pub malformed: usize,
    pub elapsed: Duration,
}

/// Deduplicate while keeping first-appearance order.
pub fn unique_in_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
