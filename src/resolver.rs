/*!
Resolver client: one DNS query of a fixed record type against a fixed
resolver endpoint.

The client owns the record-type-specific shaping of an answer:
- NS: every nameserver in the answer, response order preserved
- A: the first address only (first-wins)
- TXT: the first text record only

Failures are values. `ResolverClient::resolve` never panics and never returns
a `PipelineError`; it yields `Err(LookupFailure)` and bumps the client's own
failure counter exactly once. The counter is atomic because every in-flight
query of a stage shares the same client.

The network side sits behind the `DnsBackend` trait so stages can run against
an in-memory backend in tests. `TrustDnsBackend` is the production backend.
*/

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    error::ResolveErrorKind,
    proto::rr::{Name, RData, RecordType},
};

use crate::config::NetworkConfig;

/// Record types the pipeline queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Ns,
    A,
    Txt,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Ns => "NS",
            RecordKind::A => "A",
            RecordKind::Txt => "TXT",
        }
    }

    fn record_type(self) -> RecordType {
        match self {
            RecordKind::Ns => RecordType::NS,
            RecordKind::A => RecordType::A,
            RecordKind::Txt => RecordType::TXT,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful, shaped answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// NS: all names, in response order
    Names(Vec<String>),
    /// A / TXT: the first record
    Text(String),
}

impl Answer {
    pub fn into_names(self) -> Option<Vec<String>> {
        match self {
            Answer::Names(names) => Some(names),
            Answer::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Names(_) => None,
        }
    }
}

/// Why a single query produced no usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("invalid query name: {reason}")]
    InvalidName { reason: String },

    #[error("timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("no records of the requested type")]
    NoRecords,

    #[error("resolution failed: {reason}")]
    Resolve { reason: String },
}

/// Outcome of one query.
pub type Resolution = std::result::Result<Answer, LookupFailure>;

/// Network side of the resolver client.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Every answer record of `kind` for `query`, in response order, rendered as text.
    async fn query(
        &self,
        query: &str,
        kind: RecordKind,
    ) -> std::result::Result<Vec<String>, LookupFailure>;
}

#[async_trait]
impl<B: DnsBackend + ?Sized> DnsBackend for Arc<B> {
    async fn query(
        &self,
        query: &str,
        kind: RecordKind,
    ) -> std::result::Result<Vec<String>, LookupFailure> {
        self.as_ref().query(query, kind).await
    }
}

/// `DnsBackend` over trust-dns-resolver, pinned to a single name server.
pub struct TrustDnsBackend {
    resolver: TokioAsyncResolver,
    endpoint: SocketAddr,
    timeout: Duration,
    /// Outer bound on one lookup, covering connection setup as well.
    deadline: Duration,
}

impl TrustDnsBackend {
    pub fn new(network: &NetworkConfig) -> Self {
        let endpoint = network.endpoint();
        let servers =
            NameServerConfigGroup::from_ips_clear(&[endpoint.ip()], endpoint.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = network.dns_timeout;
        // Single attempt per query; failures are recorded, not retried.
        opts.attempts = 1;
        opts.use_hosts_file = false;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            endpoint,
            timeout: network.dns_timeout,
            deadline: network.dns_timeout.saturating_mul(2),
        }
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }
}

#[async_trait]
impl DnsBackend for TrustDnsBackend {
    async fn query(
        &self,
        query: &str,
        kind: RecordKind,
    ) -> std::result::Result<Vec<String>, LookupFailure> {
        let mut name = Name::from_ascii(query).map_err(|e| LookupFailure::InvalidName {
            reason: e.to_string(),
        })?;
        name.set_fqdn(true);

        let lookup = match timeout(self.deadline, self.resolver.lookup(name, kind.record_type()))
            .await
        {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => {
                return Err(match e.kind() {
                    ResolveErrorKind::NoRecordsFound { .. } => LookupFailure::NoRecords,
                    ResolveErrorKind::Timeout => LookupFailure::Timeout {
                        after: self.timeout,
                    },
                    _ => LookupFailure::Resolve {
                        reason: e.to_string(),
                    },
                });
            }
            Err(_) => {
                return Err(LookupFailure::Timeout {
                    after: self.deadline,
                });
            }
        };

        Ok(record_strings(kind, lookup.iter()))
    }
}

/// Render the answer records of `kind` as text, in response order.
///
/// Answers may carry the CNAME chain, which is skipped. NS names keep their
/// trailing root dot; a TXT record's character strings are concatenated.
pub fn record_strings<'a>(kind: RecordKind, rdata: impl Iterator<Item = &'a RData>) -> Vec<String> {
    rdata
        .filter_map(|rdata| match (kind, rdata) {
            (RecordKind::Ns, RData::NS(ns)) => Some(ns.0.to_utf8()),
            (RecordKind::A, RData::A(a)) => Some(a.0.to_string()),
            (RecordKind::Txt, RData::TXT(txt)) => Some(
                txt.iter()
                    .map(|part| String::from_utf8_lossy(part).into_owned())
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect()
}

/// Shape raw answer records according to the record kind.
fn shape(kind: RecordKind, records: Vec<String>) -> Resolution {
    match kind {
        RecordKind::Ns if records.is_empty() => Err(LookupFailure::NoRecords),
        RecordKind::Ns => Ok(Answer::Names(records)),
        RecordKind::A | RecordKind::Txt => records
            .into_iter()
            .next()
            .map(Answer::Text)
            .ok_or(LookupFailure::NoRecords),
    }
}

/// Resolver client for one record kind.
///
/// Created fresh per stage; its failure count is the stage's failure count.
pub struct ResolverClient<B> {
    backend: B,
    kind: RecordKind,
    failures: AtomicUsize,
}

impl<B: DnsBackend> ResolverClient<B> {
    pub fn new(backend: B, kind: RecordKind) -> Self {
        Self {
            backend,
            kind,
            failures: AtomicUsize::new(0),
        }
    }

    /// Resolve one query. Failure is a returned value, counted once.
    pub async fn resolve(&self, query: &str) -> Resolution {
        let outcome = match self.backend.query(query, self.kind).await {
            Ok(records) => shape(self.kind, records),
            Err(e) => Err(e),
        };

        if let Err(ref e) = outcome {
            self.failures.fetch_add(1, Ordering::Relaxed);
            debug!(query, record = %self.kind, "lookup failed: {e}");
        }
        outcome
    }

    /// Failed lookups so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}
