//! Port mapping strings and the per-project port maps built from them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::error::DomainError;
use crate::domain::value_objects::Protocol;

/// A parsed `[ip:][host:]container[/proto]` mapping.
///
/// The host segment is advisory only: the allocator always decides the real
/// host port. It is kept so a manifest can be echoed back faithfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
    pub container_port: u16,
    pub protocol: Option<Protocol>,
}

impl PortSpec {
    pub fn parse(spec: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidPortSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty port mapping"));
        }

        let (mapping, protocol) = match trimmed.rsplit_once('/') {
            Some((mapping, proto)) => (mapping, Some(proto.parse::<Protocol>()?)),
            None => (trimmed, None),
        };

        let parts: Vec<&str> = mapping.split(':').collect();
        let (host_ip, host, container) = match parts.as_slice() {
            [container] => (None, None, *container),
            [host, container] => (None, Some(*host), *container),
            [ip, host, container] => (Some(*ip), Some(*host), *container),
            _ => return Err(invalid("too many ':' separated segments")),
        };

        let container_port = parse_port(container).map_err(|reason| invalid(&reason))?;
        let host_port = match host {
            None | Some("") => None,
            Some(h) => Some(parse_port(h).map_err(|reason| invalid(&reason))?),
        };
        let host_ip = match host_ip {
            Some("") => return Err(invalid("empty host address")),
            other => other.map(str::to_string),
        };

        Ok(Self {
            host_ip,
            host_port,
            container_port,
            protocol,
        })
    }

    /// Render this mapping with `host_port` as the published port.
    pub fn with_host_port(&self, host_port: u16) -> String {
        let mut out = String::new();
        if let Some(ip) = &self.host_ip {
            out.push_str(ip);
            out.push(':');
        }
        out.push_str(&format!("{}:{}", host_port, self.container_port));
        if let Some(proto) = self.protocol {
            out.push('/');
            out.push_str(proto.as_str());
        }
        out
    }
}

fn parse_port(raw: &str) -> Result<u16, String> {
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a port number"))?;
    match u16::try_from(value) {
        Ok(0) => Err("port 0 is not allowed".into()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("{value} is out of range")),
    }
}

/// Internal ports a project needs host ports for, per service.
///
/// Ordered maps give the allocator its stable iteration order: service names
/// ascending, then internal ports ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortRequest(BTreeMap<String, BTreeSet<u16>>);

impl PortRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, service: impl Into<String>, internal_port: u16) {
        self.0.entry(service.into()).or_default().insert(internal_port);
    }

    pub fn with(mut self, service: impl Into<String>, internal_port: u16) -> Self {
        self.add(service, internal_port);
        self
    }

    pub fn contains(&self, service: &str, internal_port: u16) -> bool {
        self.0
            .get(service)
            .is_some_and(|ports| ports.contains(&internal_port))
    }

    /// All `(service, internal_port)` pairs in allocation order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, u16)> {
        self.0
            .iter()
            .flat_map(|(svc, ports)| ports.iter().map(move |p| (svc.as_str(), *p)))
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of allocation: service → (internal port → host port).
///
/// Scoped to one project and only used to drive synthesis and publishing;
/// the ledger is what persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPortMap(BTreeMap<String, BTreeMap<u16, u16>>);

impl ResolvedPortMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: impl Into<String>, internal_port: u16, host_port: u16) {
        self.0
            .entry(service.into())
            .or_default()
            .insert(internal_port, host_port);
    }

    pub fn host_port(&self, service: &str, internal_port: u16) -> Option<u16> {
        self.0.get(service)?.get(&internal_port).copied()
    }

    pub fn service(&self, service: &str) -> Option<&BTreeMap<u16, u16>> {
        self.0.get(service)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<u16, u16>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for ResolvedPortMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (service, ports) in &self.0 {
            for (internal, host) in ports {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{service}:{internal}->{host}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_container_port() {
        let spec = PortSpec::parse("80").unwrap();
        assert_eq!(spec.container_port, 80);
        assert_eq!(spec.host_port, None);
        assert_eq!(spec.protocol, None);
    }

    #[test]
    fn parses_host_container_and_protocol() {
        let spec = PortSpec::parse("8080:80/udp").unwrap();
        assert_eq!(spec.host_port, Some(8080));
        assert_eq!(spec.container_port, 80);
        assert_eq!(spec.protocol, Some(Protocol::Udp));
    }

    #[test]
    fn parses_bound_address() {
        let spec = PortSpec::parse("127.0.0.1:8080:80").unwrap();
        assert_eq!(spec.host_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(spec.with_host_port(10000), "127.0.0.1:10000:80");
    }

    #[test]
    fn empty_host_segment_is_absent() {
        let spec = PortSpec::parse(":443").unwrap();
        assert_eq!(spec.host_port, None);
        assert_eq!(spec.container_port, 443);
    }

    #[test]
    fn rejects_ranges_and_garbage() {
        assert!(PortSpec::parse("8000-8010:8000-8010").is_err());
        assert!(PortSpec::parse("abc").is_err());
        assert!(PortSpec::parse("70000").is_err());
        assert!(PortSpec::parse("0").is_err());
        assert!(PortSpec::parse("80/http").is_err());
        assert!(PortSpec::parse("").is_err());
    }

    #[test]
    fn with_host_port_keeps_protocol() {
        let spec = PortSpec::parse("53/udp").unwrap();
        assert_eq!(spec.with_host_port(10005), "10005:53/udp");
    }

    #[test]
    fn request_pairs_are_sorted() {
        let req = PortRequest::new()
            .with("web", 443)
            .with("db", 5432)
            .with("web", 80);
        let pairs: Vec<_> = req.pairs().collect();
        assert_eq!(pairs, vec![("db", 5432), ("web", 80), ("web", 443)]);
        assert_eq!(req.len(), 3);
    }

    #[test]
    fn resolved_map_display_is_compact() {
        let mut map = ResolvedPortMap::new();
        map.insert("app", 80, 10000);
        map.insert("db", 3306, 10001);
        assert_eq!(map.to_string(), "app:80->10000, db:3306->10001");
    }
}
