//! Built-in resolver list restored by a registry reset.

use crate::types::{Protocol, ServerKey, ServerSpec};

type Entry = (
    &'static str,
    &'static str,
    Protocol,
    &'static [&'static str],
    &'static [&'static str],
);

#[rustfmt::skip]
const DEFAULT_SERVERS: &[Entry] = &[
    // Cloudflare
    ("CLOUDFLARE_DNS", "Cloudflare DNS", Protocol::Plain, &["1.1.1.1", "1.0.0.1"], &["Cloudflare", "Privacy"]),
    ("CLOUDFLARE_DOH", "Cloudflare DoH", Protocol::Doh, &["https://cloudflare-dns.com/dns-query"], &["Cloudflare", "Privacy"]),
    ("CLOUDFLARE_DOT", "Cloudflare DoT", Protocol::Dot, &["tls://one.one.one.one:853"], &["Cloudflare", "Privacy"]),
    ("CLOUDFLARE_DOQ", "Cloudflare DoQ", Protocol::Doq, &["quic://one.one.one.one:853"], &["Cloudflare", "Privacy"]),
    ("CLOUDFLARE_DOH3", "Cloudflare DoH3", Protocol::Doh3, &["h3://cloudflare-dns.com:443"], &["Cloudflare", "Privacy"]),
    // Google
    ("GOOGLE_DNS", "Google DNS", Protocol::Plain, &["8.8.8.8", "8.8.4.4"], &["Google", "General"]),
    ("GOOGLE_DOH", "Google DoH", Protocol::Doh, &["https://dns.google/dns-query"], &["Google", "General"]),
    ("GOOGLE_DOT", "Google DoT", Protocol::Dot, &["tls://dns.google:853"], &["Google", "General"]),
    // Quad9
    ("QUAD9_DNS", "Quad9 DNS", Protocol::Plain, &["9.9.9.9", "149.112.112.112"], &["Quad9", "Security"]),
    ("QUAD9_DOH", "Quad9 DoH", Protocol::Doh, &["https://dns.quad9.net/dns-query"], &["Quad9", "Security"]),
    ("QUAD9_DOT", "Quad9 DoT", Protocol::Dot, &["tls://dns.quad9.net:853"], &["Quad9", "Security"]),
    ("QUAD9_DOQ", "Quad9 DoQ", Protocol::Doq, &["quic://dns.quad9.net:853"], &["Quad9", "Security"]),
    // AdGuard
    ("ADGUARD_DNS", "AdGuard DNS", Protocol::Plain, &["94.140.14.14", "94.140.15.15"], &["AdGuard", "AdBlock"]),
    ("ADGUARD_DOH", "AdGuard DoH", Protocol::Doh, &["https://dns.adguard-dns.com/dns-query"], &["AdGuard", "AdBlock"]),
    ("ADGUARD_DOT", "AdGuard DoT", Protocol::Dot, &["tls://dns.adguard-dns.com:853"], &["AdGuard", "AdBlock"]),
    ("ADGUARD_DOQ", "AdGuard DoQ", Protocol::Doq, &["quic://dns.adguard-dns.com:853"], &["AdGuard", "AdBlock"]),
    // ControlD free tier
    ("CONTROLD_DNS", "ControlD DNS", Protocol::Plain, &["76.76.2.0", "76.76.10.0"], &["ControlD", "Privacy"]),
    ("CONTROLD_DOH", "ControlD DoH", Protocol::Doh, &["https://p2.freedns.controld.com/dns-query"], &["ControlD", "Privacy"]),
    ("CONTROLD_DOT", "ControlD DoT", Protocol::Dot, &["tls://p2.freedns.controld.com:853"], &["ControlD", "Privacy"]),
    ("CONTROLD_DOQ", "ControlD DoQ", Protocol::Doq, &["quic://p2.freedns.controld.com:853"], &["ControlD", "Privacy"]),
    ("CONTROLD_DOH3", "ControlD DoH3", Protocol::Doh3, &["h3://p2.freedns.controld.com:443"], &["ControlD", "Privacy"]),
    // Regional
    ("DYNX_ADBLOCK", "DynX AdBlock DoH", Protocol::Doh, &["https://dns.dynx.pro/dns-query"], &["AdBlock", "Privacy"]),
    ("DYNX_ANTI_BAN_DOH", "DynX AntiBan DoH", Protocol::Doh, &["https://anti-ban.dynx.pro/dns-query"], &["Bypass", "AntiBan", "Gaming"]),
    ("DYNX_ANTI_BAN_DNS", "DynX AntiBan DNS", Protocol::Plain, &["10.70.95.150", "10.70.95.162"], &["Bypass", "AntiBan", "Gaming"]),
    ("SHECAN_DNS", "Shecan DNS", Protocol::Plain, &["178.22.122.100", "185.51.200.2"], &["Iran", "Gaming", "Web"]),
    ("YANDEX_DNS", "Yandex DNS", Protocol::Plain, &["77.88.8.8", "77.88.8.1"], &["Yandex", "Web"]),
];

/// The built-in server list, in display order
#[must_use]
pub fn default_servers() -> Vec<ServerSpec> {
    DEFAULT_SERVERS
        .iter()
        .map(|(key, name, protocol, endpoints, tags)| ServerSpec {
            key: ServerKey::new(*key),
            name: (*name).to_string(),
            protocol: *protocol,
            endpoints: endpoints.iter().map(ToString::to_string).collect(),
            tags: tags.iter().map(ToString::to_string).collect(),
            bootstrap_ip: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{validate_and_normalize, ServerInput};
    use std::collections::HashSet;

    #[test]
    fn test_defaults_have_unique_keys() {
        let servers = default_servers();
        let keys: HashSet<_> = servers.iter().map(|s| s.key.clone()).collect();
        assert_eq!(keys.len(), servers.len());
        assert_eq!(servers.len(), 26);
    }

    #[test]
    fn test_defaults_are_canonical() {
        for server in default_servers() {
            let normalized =
                validate_and_normalize(&ServerInput::from_spec(&server), server.protocol)
                    .unwrap_or_else(|e| panic!("{}: {e}", server.key));
            assert_eq!(normalized.endpoints, server.endpoints, "{}", server.key);
            assert_eq!(normalized.tags, server.tags);
        }
    }

    #[test]
    fn test_every_protocol_represented() {
        let servers = default_servers();
        for protocol in Protocol::ALL {
            assert!(servers.iter().any(|s| s.protocol == protocol), "{protocol}");
        }
    }
}
