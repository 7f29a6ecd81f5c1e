//! Endpoint address resolution
//!
//! Turns a DNS-aware document into a resolved one. Each side of a tunnel
//! is decided independently by this table, top to bottom:
//!
//! | literal | name | outcome                                          |
//! |---------|------|--------------------------------------------------|
//! | -       | -    | tunnel dropped before any lookup, error logged   |
//! | set     | any  | literal address (name still looked up and logged)|
//! | -       | set  | first AAAA answer; warn if there were several    |
//! | -       | set  | lookup failed: warn, then tunnel dropped         |
//!
//! Dropping a tunnel never fails the whole document.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use etherip_sync_common::{DnsLookup, SyncError, SyncResult};
use tokio::net;
use tracing::{debug, error, warn};

use crate::config::{Conf, ConfWithDns, TunnelWithDns};
use crate::types::TunnelSpec;

/// Resolver backed by the system's `getaddrinfo`, keeping IPv6 answers only
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl DnsLookup for SystemResolver {
    async fn lookup_aaaa(&self, fqdn: &str) -> SyncResult<Vec<String>> {
        // lookup_host wants a host:port pair
        let addrs = net::lookup_host((fqdn, 0))
            .await
            .map_err(|e| SyncError::resolve(fqdn, e.to_string()))?;

        let results = ipv6_answers(addrs);
        if results.is_empty() {
            return Err(SyncError::resolve(fqdn, "no AAAA record found"));
        }
        debug!(fqdn = %fqdn, count = results.len(), "resolved");
        Ok(results)
    }
}

/// Keeps native IPv6 answers in resolver order, without duplicates
///
/// IPv4 answers and IPv4-mapped IPv6 answers (`::ffff:a.b.c.d`) are
/// dropped; neither can carry an IPv6 tunnel.
fn ipv6_answers(addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<String> {
    let mut results: Vec<String> = Vec::new();
    for addr in addrs {
        let SocketAddr::V6(v6) = addr else {
            continue;
        };
        if v6.ip().to_ipv4_mapped().is_some() {
            continue;
        }
        let ip = v6.ip().to_string();
        if !results.contains(&ip) {
            results.push(ip);
        }
    }
    results
}

/// Tunnel endpoint side, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => f.write_str("local"),
            Side::Remote => f.write_str("remote"),
        }
    }
}

/// One side of a tunnel as declared; empty strings count as absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub ip_addr: Option<&'a str>,
    pub fqdn: Option<&'a str>,
}

impl<'a> Endpoint<'a> {
    pub fn new(ip_addr: &'a str, fqdn: &'a str) -> Self {
        let non_empty = |s: &'a str| Some(s).filter(|s| !s.is_empty());
        Self {
            ip_addr: non_empty(ip_addr),
            fqdn: non_empty(fqdn),
        }
    }

    pub fn local(entry: &'a TunnelWithDns) -> Self {
        Self::new(&entry.local_ip_addr, &entry.local_fqdn)
    }

    pub fn remote(entry: &'a TunnelWithDns) -> Self {
        Self::new(&entry.remote_ip_addr, &entry.remote_fqdn)
    }

    pub fn is_empty(&self) -> bool {
        self.ip_addr.is_none() && self.fqdn.is_none()
    }
}

/// Applies the resolution table to whole documents
pub struct AddressResolver<D> {
    dns: D,
}

impl<D: DnsLookup> AddressResolver<D> {
    pub fn new(dns: D) -> Self {
        Self { dns }
    }

    /// Resolves every tunnel, dropping those left without an address
    pub async fn resolve_document(&self, doc: &ConfWithDns) -> Conf {
        let mut out = Conf::default();
        for entry in &doc.tunnels {
            if let Some(spec) = self.resolve_tunnel(entry).await {
                out.tunnels.push(spec);
            }
        }
        out
    }

    /// Resolves one tunnel; `None` means it was dropped
    pub async fn resolve_tunnel(&self, entry: &TunnelWithDns) -> Option<TunnelSpec> {
        let local = Endpoint::local(entry);
        let remote = Endpoint::remote(entry);

        // Empty sides are rejected before any lookup is made
        for (side, endpoint) in [(Side::Local, local), (Side::Remote, remote)] {
            if endpoint.is_empty() {
                error!(
                    tunnel = %entry.name,
                    side = %side,
                    "Neither an IP address nor an FQDN is set, skipping tunnel"
                );
                return None;
            }
        }

        let local = self.resolve_endpoint(&entry.name, Side::Local, local).await?;
        let remote = self
            .resolve_endpoint(&entry.name, Side::Remote, remote)
            .await?;
        Some(TunnelSpec::new(&entry.name, local, remote))
    }

    async fn resolve_endpoint(
        &self,
        tunnel: &str,
        side: Side,
        endpoint: Endpoint<'_>,
    ) -> Option<String> {
        let resolved = match endpoint.fqdn {
            Some(fqdn) => self.first_answer(side, fqdn).await,
            None => None,
        };

        // Literal address wins over whatever the name resolved to
        let chosen = endpoint.ip_addr.map(str::to_string).or(resolved);
        if chosen.is_none() {
            error!(
                tunnel = %tunnel,
                side = %side,
                "No address could be derived, skipping tunnel"
            );
        }
        chosen
    }

    async fn first_answer(&self, side: Side, fqdn: &str) -> Option<String> {
        match self.dns.lookup_aaaa(fqdn).await {
            Ok(answers) => {
                if answers.len() > 1 {
                    warn!(
                        side = %side,
                        fqdn = %fqdn,
                        dns_answers = ?answers,
                        "Multiple AAAA records, using the first IPv6 address"
                    );
                }
                answers.into_iter().next()
            }
            Err(e) => {
                warn!(side = %side, fqdn = %fqdn, error = %e, "FQDN resolve failed");
                None
            }
        }
    }
}
