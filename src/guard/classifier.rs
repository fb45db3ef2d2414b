// SPDX-License-Identifier: GPL-3.0-only
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::resolver::ResolvedAddress;

/// A disallowed CIDR range together with a short label for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedRange {
    pub cidr: IpNet,
    pub label: &'static str,
}

impl fmt::Display for BlockedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cidr, self.label)
    }
}

/// Classification of a single resolved address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressVerdict {
    pub address: ResolvedAddress,
    pub allowed: bool,
    pub blocked_range: Option<BlockedRange>,
}

const fn v4(a: u8, b: u8, c: u8, d: u8, prefix: u8, label: &'static str) -> (Ipv4Net, &'static str) {
    (Ipv4Net::new_assert(Ipv4Addr::new(a, b, c, d), prefix), label)
}

const fn v6(segments: [u16; 8], prefix: u8, label: &'static str) -> (Ipv6Net, &'static str) {
    let [a, b, c, d, e, f, g, h] = segments;
    (Ipv6Net::new_assert(Ipv6Addr::new(a, b, c, d, e, f, g, h), prefix), label)
}

/// IPv4 ranges that must never be fetched from
const BLOCKED_V4: &[(Ipv4Net, &str)] = &[
    v4(127, 0, 0, 0, 8, "loopback"),
    v4(10, 0, 0, 0, 8, "private"),
    v4(172, 16, 0, 0, 12, "private"),
    v4(192, 168, 0, 0, 16, "private"),
    v4(169, 254, 0, 0, 16, "link-local"),
    v4(0, 0, 0, 0, 8, "this network"),
    v4(100, 64, 0, 0, 10, "carrier-grade NAT"),
    v4(192, 0, 0, 0, 24, "IETF protocol assignments"),
    v4(192, 0, 2, 0, 24, "documentation"),
    v4(198, 51, 100, 0, 24, "documentation"),
    v4(203, 0, 113, 0, 24, "documentation"),
    v4(198, 18, 0, 0, 15, "benchmarking"),
    v4(224, 0, 0, 0, 4, "multicast"),
    v4(240, 0, 0, 0, 4, "reserved"),
];

/// IPv6 ranges that must never be fetched from
const BLOCKED_V6: &[(Ipv6Net, &str)] = &[
    v6([0, 0, 0, 0, 0, 0, 0, 1], 128, "loopback"),
    v6([0, 0, 0, 0, 0, 0, 0, 0], 128, "unspecified"),
    v6([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7, "unique-local"),
    v6([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10, "link-local"),
    v6([0xff00, 0, 0, 0, 0, 0, 0, 0], 8, "multicast"),
    v6([0x2001, 0x0db8, 0, 0, 0, 0, 0, 0], 32, "documentation"),
    v6([0x0064, 0xff9b, 0x0001, 0, 0, 0, 0, 0], 48, "local-use NAT64"),
];

/// Classify an address against the disallowed range table
///
/// IPv6 forms that carry an embedded IPv4 address (mapped, translated,
/// compatible, NAT64, 6to4, Teredo) are judged by the embedded address.
pub fn classify(ip: IpAddr) -> AddressVerdict {
    let blocked_range = blocked_range_for(ip);
    AddressVerdict {
        address: ResolvedAddress::new(ip),
        allowed: blocked_range.is_none(),
        blocked_range,
    }
}

/// Same as [`classify`], but addresses inside one of `exempt` are allowed
pub fn classify_with_exemptions(ip: IpAddr, exempt: &[IpNet]) -> AddressVerdict {
    if exempt.iter().any(|net| net.contains(&ip)) {
        return AddressVerdict {
            address: ResolvedAddress::new(ip),
            allowed: true,
            blocked_range: None,
        };
    }
    classify(ip)
}

fn blocked_range_for(ip: IpAddr) -> Option<BlockedRange> {
    match ip {
        IpAddr::V4(ipv4) => blocked_v4(ipv4),
        IpAddr::V6(ipv6) => blocked_v6(ipv6),
    }
}

fn blocked_v4(ip: Ipv4Addr) -> Option<BlockedRange> {
    BLOCKED_V4
        .iter()
        .find(|(net, _)| net.contains(&ip))
        .map(|(net, label)| BlockedRange {
            cidr: IpNet::V4(*net),
            label: *label,
        })
}

fn blocked_v6(ip: Ipv6Addr) -> Option<BlockedRange> {
    if let Some(range) = BLOCKED_V6
        .iter()
        .find(|(net, _)| net.contains(&ip))
        .map(|(net, label)| BlockedRange {
            cidr: IpNet::V6(*net),
            label: *label,
        })
    {
        return Some(range);
    }

    embedded_ipv4(ip).and_then(blocked_v4)
}

/// Extract an IPv4 address tunnelled inside an IPv6 address
fn embedded_ipv4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return Some(mapped);
    }

    let s = ip.segments();
    let low32 = Ipv4Addr::new((s[6] >> 8) as u8, s[6] as u8, (s[7] >> 8) as u8, s[7] as u8);

    // ::ffff:0:a.b.c.d (IPv4-translated)
    if s[..6] == [0, 0, 0, 0, 0xffff, 0] {
        return Some(low32);
    }

    // ::a.b.c.d (deprecated IPv4-compatible); :: and ::1 are handled by the table
    if s[..6] == [0, 0, 0, 0, 0, 0] {
        return Some(low32);
    }

    // 64:ff9b::a.b.c.d (NAT64 well-known prefix)
    if s[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        return Some(low32);
    }

    // 2002:aabb:ccdd::/48 (6to4)
    if s[0] == 0x2002 {
        return Some(Ipv4Addr::new(
            (s[1] >> 8) as u8,
            s[1] as u8,
            (s[2] >> 8) as u8,
            s[2] as u8,
        ));
    }

    // 2001:0::/32 (Teredo); the client address is stored bit-inverted
    if s[0] == 0x2001 && s[1] == 0 {
        return Some(Ipv4Addr::from(!u32::from(low32)));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denied(addr: &str) -> bool {
        !classify(addr.parse().unwrap()).allowed
    }

    fn range_of(addr: &str) -> String {
        classify(addr.parse().unwrap())
            .blocked_range
            .map(|r| r.cidr.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_disallowed_table_samples() {
        for addr in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "169.254.1.1",
            "0.0.0.1",
            "::1",
            "fe80::1",
            "fc00::1",
        ] {
            assert!(denied(addr), "{addr} should be denied");
        }
    }

    #[test]
    fn test_public_addresses_allowed() {
        for addr in ["8.8.8.8", "93.184.216.34", "1.1.1.1", "2606:4700:4700::1111"] {
            let verdict = classify(addr.parse().unwrap());
            assert!(verdict.allowed, "{addr} should be allowed");
            assert!(verdict.blocked_range.is_none());
        }
    }

    #[test]
    fn test_blocked_range_recorded() {
        assert_eq!(range_of("127.0.0.1"), "127.0.0.0/8");
        assert_eq!(range_of("10.1.2.3"), "10.0.0.0/8");
        assert_eq!(range_of("172.20.0.1"), "172.16.0.0/12");
        assert_eq!(range_of("192.168.1.1"), "192.168.0.0/16");
        assert_eq!(range_of("169.254.169.254"), "169.254.0.0/16");
        assert_eq!(range_of("0.0.0.1"), "0.0.0.0/8");
        assert_eq!(range_of("100.64.0.1"), "100.64.0.0/10");
        assert_eq!(range_of("::1"), "::1/128");
        assert_eq!(range_of("fc00::1"), "fc00::/7");
        assert_eq!(range_of("fe80::1"), "fe80::/10");
    }

    #[test]
    fn test_private_range_boundaries() {
        assert!(!denied("9.255.255.255"));
        assert!(!denied("11.0.0.0"));
        assert!(!denied("172.15.255.255"));
        assert!(!denied("172.32.0.0"));
        assert!(!denied("192.167.255.255"));
        assert!(!denied("192.169.0.0"));
        assert!(!denied("100.63.255.255"));
        assert!(denied("100.127.255.255"));
        assert!(!denied("100.128.0.0"));
    }

    #[test]
    fn test_reserved_ranges() {
        assert!(denied("224.0.0.1"));
        assert!(denied("255.255.255.255"));
        assert!(denied("192.0.2.10"));
        assert!(denied("198.18.0.1"));
        assert!(denied("::"));
        assert!(denied("ff02::1"));
    }

    #[test]
    fn test_ipv4_mapped_ipv6() {
        assert!(denied("::ffff:127.0.0.1"));
        assert!(denied("::ffff:7f00:1"));
        assert!(denied("::ffff:10.0.0.1"));
        assert!(denied("::ffff:169.254.169.254"));
        assert_eq!(range_of("::ffff:192.168.0.1"), "192.168.0.0/16");
        assert!(!denied("::ffff:8.8.8.8"));
    }

    #[test]
    fn test_other_embedded_ipv4_forms() {
        // IPv4-compatible, NAT64 and 6to4 all carry the address through
        assert!(denied("::127.0.0.1"));
        assert!(denied("64:ff9b::10.0.0.1"));
        assert!(denied("2002:a9fe:a9fe::1"));
        assert!(!denied("64:ff9b::8.8.8.8"));
        assert!(!denied("2002:0808:0808::1"));
    }

    #[test]
    fn test_translated_and_tunnelled_forms() {
        assert!(denied("::ffff:0:127.0.0.1"));
        assert!(denied("::ffff:0:a00:1"));
        assert!(!denied("::ffff:0:8.8.8.8"));

        // Local-use NAT64 is never routed publicly
        assert!(denied("64:ff9b:1::a00:1"));
        assert!(denied("64:ff9b:1::808:808"));
        assert_eq!(range_of("64:ff9b:1::a00:1"), "64:ff9b:1::/48");

        // Teredo client 10.0.0.1 and 8.8.8.8, inverted
        assert!(denied("2001:0:4136:e378:8000:63bf:f5ff:fffe"));
        assert!(!denied("2001:0:4136:e378:8000:63bf:f7f7:f7f7"));
    }

    #[test]
    fn test_exemptions() {
        let exempt: Vec<IpNet> = vec!["127.0.0.1/32".parse().unwrap()];
        assert!(classify_with_exemptions("127.0.0.1".parse().unwrap(), &exempt).allowed);
        assert!(!classify_with_exemptions("127.0.0.2".parse().unwrap(), &exempt).allowed);
        assert!(!classify_with_exemptions("10.0.0.1".parse().unwrap(), &exempt).allowed);
    }
}
