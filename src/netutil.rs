/*!
Name construction helpers for the resolution stages.

This module centralizes:
- Team Cymru origin query construction (reverse-octet IP + `origin.asn.cymru.com`)
- Team Cymru AS description query construction (`AS{asn}.asn.cymru.com`)
- Hostname normalization and the in-bailiwick test
*/

/// Zone answering IP -> origin ASN TXT queries.
pub const CYMRU_ORIGIN_ZONE: &str = "origin.asn.cymru.com";

/// Zone answering ASN -> AS description TXT queries.
pub const CYMRU_ASN_ZONE: &str = "asn.cymru.com";

/// Build the origin query for an IPv4 address: octets reversed, zone appended.
///
/// Works label-wise on the text form so the query mirrors whatever was
/// persisted by the previous stage.
pub fn ip_to_origin_query(ip: &str) -> String {
    let mut labels: Vec<&str> = ip.split('.').collect();
    labels.reverse();
    format!("{}.{CYMRU_ORIGIN_ZONE}", labels.join("."))
}

/// Build the AS description query for an ASN identifier.
pub fn asn_to_query(asn: &str) -> String {
    format!("AS{asn}.{CYMRU_ASN_ZONE}")
}

/// Lowercase and drop the trailing root dot.
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// True when `nameserver` lies within `domain` (equal to it, or a subdomain of it).
pub fn is_in_bailiwick(nameserver: &str, domain: &str) -> bool {
    let ns = normalize_host(nameserver);
    let zone = normalize_host(domain);
    if zone.is_empty() {
        return false;
    }
    ns == zone || ns.ends_with(&format!(".{zone}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_query_reverses_octets() {
        assert_eq!(ip_to_origin_query("1.2.3.4"), "4.3.2.1.origin.asn.cymru.com");
        assert_eq!(
            ip_to_origin_query("203.0.113.7"),
            "7.113.0.203.origin.asn.cymru.com"
        );
    }

    #[test]
    fn test_asn_query() {
        assert_eq!(asn_to_query("15169"), "AS15169.asn.cymru.com");
    }

    #[test]
    fn test_bailiwick() {
        assert!(is_in_bailiwick("ns1.google.com.", "google.com"));
        assert!(is_in_bailiwick("NS1.Google.COM", "google.com"));
        assert!(is_in_bailiwick("google.com.", "google.com"));
        assert!(!is_in_bailiwick("ns1.notgoogle.com.", "google.com"));
        assert!(!is_in_bailiwick("a.iana-servers.net.", "example.com"));
        assert!(!is_in_bailiwick("ns1.example.com.", ""));
    }
}
