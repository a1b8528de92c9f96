//! Performance benchmarks for dnsdeps components.
//!
//! These benchmarks cover the hot per-record work: parsing Team Cymru TXT
//! answers, bailiwick checks, and aggregation over mapping sets sized like
//! real ranked-list runs.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::io::Write;
use tempfile::NamedTempFile;

use dnsdeps::analysis::Mappings;
use dnsdeps::netutil;
use dnsdeps::pipeline::stages::{parse_organization_text, parse_origin_text};
use dnsdeps::store;

const ORIGIN_TXT: &str = "\"15169 | 8.8.8.0/24 | US | arin | 2014-03-14\"";
const MULTI_ORIGIN_TXT: &str = "\"13335 209242 | 104.16.0.0/13 | US | arin | 2014-03-28\"";
const ORG_TXT: &str = "\"15169 | US | arin | 2000-03-30 | GOOGLE, US\"";

/// Synthetic mappings: `domains` domains over a pool of providers.
fn synthetic_mappings(domains: usize) -> Mappings {
    let mut mappings = Mappings::default();
    let providers = 50;
    for p in 0..providers {
        let asn = (64_512 + p).to_string();
        let ip = format!("10.0.{}.{}", p / 250, p % 250 + 1);
        mappings.addresses.insert(format!("ns.provider{p}.net."), ip.clone());
        mappings.asns.insert(ip, vec![asn.clone()]);
        mappings.organizations.insert(asn, Some(format!("PROVIDER{p}-AS, US")));
    }
    for d in 0..domains {
        let domain = format!("site{d}.com");
        let mut nameservers = vec![format!("ns.provider{}.net.", d % providers)];
        if d % 3 == 0 {
            nameservers.push(format!("ns.provider{}.net.", (d * 7) % providers));
        }
        if d % 5 == 0 {
            nameservers.push(format!("ns1.{domain}."));
        }
        mappings.nameservers.insert(domain, nameservers);
    }
    mappings
}

fn bench_txt_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("txt_parsing");

    group.bench_function("origin_single_asn", |b| {
        b.iter(|| parse_origin_text(black_box(ORIGIN_TXT)))
    });

    group.bench_function("origin_multi_asn", |b| {
        b.iter(|| parse_origin_text(black_box(MULTI_ORIGIN_TXT)))
    });

    group.bench_function("organization", |b| {
        b.iter(|| parse_organization_text(black_box(ORG_TXT)))
    });

    group.finish();
}

fn bench_query_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_building");

    group.bench_function("ip_to_origin_query", |b| {
        b.iter(|| netutil::ip_to_origin_query(black_box("192.0.2.153")))
    });

    group.bench_function("asn_to_query", |b| {
        b.iter(|| netutil::asn_to_query(black_box("15169")))
    });

    group.bench_function("is_in_bailiwick", |b| {
        b.iter(|| netutil::is_in_bailiwick(black_box("NS1.Example.COM."), black_box("example.com")))
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for &domains in &[100usize, 1_000, 10_000] {
        let mappings = synthetic_mappings(domains);
        group.throughput(Throughput::Elements(domains as u64));
        group.bench_with_input(
            BenchmarkId::new("analyze", domains),
            &mappings,
            |b, mappings| b.iter(|| black_box(mappings.analyze())),
        );
    }

    group.finish();
}

fn bench_ranked_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranked_list");

    let mut file = NamedTempFile::new().unwrap();
    for rank in 1..=10_000 {
        writeln!(file, "{rank},site{rank}.com").unwrap();
    }
    file.flush().unwrap();

    for &limit in &[1_000usize, 10_000] {
        group.throughput(Throughput::Elements(limit as u64));
        group.bench_with_input(BenchmarkId::new("read", limit), &limit, |b, &limit| {
            b.iter(|| store::read_ranked_domains(black_box(file.path()), limit))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_txt_parsing,
    bench_query_building,
    bench_aggregation,
    bench_ranked_list
);

criterion_main!(benches);
