//! The four resolution stages.
//!
//! | Stage | Record | Query | Failure policy |
//! |---|---|---|---|
//! | domain -> NS | NS | the domain | drop |
//! | NS -> IP | A | the hostname | drop |
//! | IP -> ASN | TXT | reversed octets + `origin.asn.cymru.com` | drop |
//! | ASN -> org | TXT | `AS{asn}.asn.cymru.com` | keep key, null org |
//!
//! Each entry point reads the previous mapping (missing file is fatal),
//! runs its batch, writes its own mapping and returns a [`StageReport`].

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::info;

use super::{MalformedResponse, Stage, StageId, StageReport, unique_in_order};
use crate::config::Config;
use crate::errors::Result;
use crate::netutil::{asn_to_query, ip_to_origin_query};
use crate::resolver::{Answer, DnsBackend};
use crate::store::{self, AsnMap, IpMap, NameserverSet, OrgMap};

/// Field separator in Team Cymru TXT answers.
const CYMRU_FIELD_SEPARATOR: &str = " | ";

fn identity(query: &str) -> String {
    query.to_string()
}

fn cymru_fields(text: &str) -> Vec<&str> {
    text.split(CYMRU_FIELD_SEPARATOR).collect()
}

fn strip_quotes(field: &str) -> &str {
    field.trim_matches('"').trim()
}

/// NS answer: the name list, verbatim.
pub fn parse_nameservers(answer: Answer) -> std::result::Result<Vec<String>, MalformedResponse> {
    answer
        .into_names()
        .ok_or_else(|| MalformedResponse::new("expected a nameserver list"))
}

/// A answer: the single address string.
pub fn parse_address(answer: Answer) -> std::result::Result<String, MalformedResponse> {
    answer
        .into_text()
        .ok_or_else(|| MalformedResponse::new("expected a single address"))
}

/// Origin TXT text: first field, unquoted, split on whitespace.
///
/// `"15169 | 8.8.8.0/24 | US | arin | 2014-03-14"` gives `["15169"]`; a
/// multi-origin prefix gives several ASNs.
pub fn parse_origin_text(text: &str) -> std::result::Result<Vec<String>, MalformedResponse> {
    let first = cymru_fields(text).first().copied().unwrap_or_default();
    let asns: Vec<String> = strip_quotes(first)
        .split_whitespace()
        .map(str::to_string)
        .collect();

    if asns.is_empty() {
        return Err(MalformedResponse::new(format!("no ASN in origin record {text:?}")));
    }
    if let Some(bad) = asns.iter().find(|a| !a.chars().all(|c| c.is_ascii_digit())) {
        return Err(MalformedResponse::new(format!(
            "unexpected ASN token {bad:?} in origin record {text:?}"
        )));
    }
    Ok(asns)
}

pub fn parse_origin_asns(answer: Answer) -> std::result::Result<Vec<String>, MalformedResponse> {
    let text = answer
        .into_text()
        .ok_or_else(|| MalformedResponse::new("expected a TXT string"))?;
    parse_origin_text(&text)
}

/// AS description TXT text: last field, unquoted.
///
/// `"15169 | US | arin | 2000-03-30 | GOOGLE, US"` gives `GOOGLE, US`.
pub fn parse_organization_text(text: &str) -> std::result::Result<String, MalformedResponse> {
    let fields = cymru_fields(text);
    if fields.len() < 2 {
        return Err(MalformedResponse::new(format!(
            "expected '|'-separated AS description, got {text:?}"
        )));
    }
    let org = fields.last().map(|f| strip_quotes(f)).unwrap_or_default();
    if org.is_empty() {
        return Err(MalformedResponse::new(format!(
            "empty organization in AS description {text:?}"
        )));
    }
    Ok(org.to_string())
}

pub fn parse_organization(answer: Answer) -> std::result::Result<String, MalformedResponse> {
    let text = answer
        .into_text()
        .ok_or_else(|| MalformedResponse::new("expected a TXT string"))?;
    parse_organization_text(&text)
}

pub const NAMESERVER_STAGE: Stage<Vec<String>> = Stage {
    id: StageId::Nameservers,
    build_query: identity,
    parse: parse_nameservers,
};

pub const ADDRESS_STAGE: Stage<String> = Stage {
    id: StageId::Addresses,
    build_query: identity,
    parse: parse_address,
};

pub const ASN_STAGE: Stage<Vec<String>> = Stage {
    id: StageId::Asns,
    build_query: ip_to_origin_query,
    parse: parse_origin_asns,
};

pub const ORGANIZATION_STAGE: Stage<String> = Stage {
    id: StageId::Organizations,
    build_query: asn_to_query,
    parse: parse_organization,
};

/// `counts` is `(queries, failures, malformed)` from the stage's run.
fn report(
    stage: StageId,
    counts: (usize, usize, usize),
    entries: usize,
    started: Instant,
) -> StageReport {
    let (queries, failures, malformed) = counts;
    let report = StageReport {
        stage,
        queries,
        entries,
        failures,
        malformed,
        elapsed: started.elapsed(),
    };
    info!(
        stage = stage.step(),
        queries,
        entries,
        failures,
        malformed,
        "stage complete"
    );
    report
}

/// Stage 1: ranked domains -> nameservers.
pub async fn resolve_nameservers<B: DnsBackend>(
    backend: B,
    config: &Config,
) -> Result<StageReport> {
    let started = Instant::now();
    let domains = unique_in_order(store::read_ranked_domains(
        &config.paths.input,
        config.pipeline.record_limit,
    )?);

    let run = NAMESERVER_STAGE
        .run(backend, domains, config.pipeline.max_concurrency)
        .await;
    let counts = (run.queries, run.failures, run.malformed);

    let nameservers: NameserverSet = run.dropping_failures();
    store::write_mapping(&config.paths.nameservers(), &nameservers)?;

    Ok(report(StageId::Nameservers, counts, nameservers.len(), started))
}

/// Stage 2: nameserver hostnames -> first IPv4 address.
pub async fn resolve_addresses<B: DnsBackend>(backend: B, config: &Config) -> Result<StageReport> {
    let started = Instant::now();
    let nameservers: NameserverSet = store::read_mapping(&config.paths.nameservers())?;
    let hosts = unique_in_order(nameservers.into_values().flatten());

    let run = ADDRESS_STAGE
        .run(backend, hosts, config.pipeline.max_concurrency)
        .await;
    let counts = (run.queries, run.failures, run.malformed);

    let addresses: IpMap = run.dropping_failures();
    store::write_mapping(&config.paths.nameserver_ips(), &addresses)?;

    Ok(report(StageId::Addresses, counts, addresses.len(), started))
}

/// Stage 3: IP addresses -> origin ASNs.
pub async fn resolve_asns<B: DnsBackend>(backend: B, config: &Config) -> Result<StageReport> {
    let started = Instant::now();
    let addresses: IpMap = store::read_mapping(&config.paths.nameserver_ips())?;
    let ips = unique_in_order(addresses.into_values());

    let run = ASN_STAGE
        .run(backend, ips, config.pipeline.max_concurrency)
        .await;
    let counts = (run.queries, run.failures, run.malformed);

    let asns: AsnMap = run.dropping_failures();
    store::write_mapping(&config.paths.ip_asns(), &asns)?;

    Ok(report(StageId::Asns, counts, asns.len(), started))
}

/// Stage 4: unique ASNs -> organization names. Failed ASNs stay, with null.
pub async fn resolve_organizations<B: DnsBackend>(
    backend: B,
    config: &Config,
) -> Result<StageReport> {
    let started = Instant::now();
    let asns: AsnMap = store::read_mapping(&config.paths.ip_asns())?;
    let unique: BTreeSet<String> = asns.into_values().flatten().collect();

    let run = ORGANIZATION_STAGE
        .run(backend, unique.into_iter().collect(), config.pipeline.max_concurrency)
        .await;
    let counts = (run.queries, run.failures, run.malformed);

    let orgs: OrgMap = run.keeping_failures();
    store::write_mapping(&config.paths.asn_orgs(), &orgs)?;

    Ok(report(StageId::Organizations, counts, orgs.len(), started))
}

/// Run the four stages strictly in sequence, each on a fresh resolver client.
///
/// `on_report` is called after each stage has persisted its mapping.
pub async fn run_all<B, F>(
    backend: B,
    config: &Config,
    mut on_report: F,
) -> Result<Vec<StageReport>>
where
    B: DnsBackend + Clone,
    F: FnMut(StageId, Option<&StageReport>),
{
    let mut reports = Vec::with_capacity(StageId::ALL.len());
    for stage in StageId::ALL {
        on_report(stage, None);
        let report = match stage {
            StageId::Nameservers => resolve_nameservers(backend.clone(), config).await?,
            StageId::Addresses => resolve_addresses(backend.clone(), config).await?,
            StageId::Asns => resolve_asns(backend.clone(), config).await?,
            StageId::Organizations => resolve_organizations(backend.clone(), config).await?,
        };
        on_report(stage, Some(&report));
        reports.push(report);
    }
    Ok(reports)
}
