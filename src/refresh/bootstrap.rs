//! Bootstrap seeds.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::net::{Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use crate::{Error, Result};

pub const DEFAULT_BOOTSTRAP_NODES: [&str; 4] = [
    "router.bittorrent.com:6881",
    "dht.transmissionbt.com:6881",
    "dht.libtorrent.org:25401",
    "relay.pkarr.org:6881",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A validated `host:port` bootstrap seed. Resolving the host is left to
/// [ToSocketAddrs], so parsing never touches the network.
pub struct SeedAddr {
    host: String,
    port: u16,
}

impl SeedAddr {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for SeedAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidBootstrapAddress(s.to_string());

        if let Ok(address) = s.parse::<SocketAddr>() {
            if address.port() == 0 {
                return Err(invalid());
            }

            return Ok(SeedAddr {
                host: address.ip().to_string(),
                port: address.port(),
            });
        }

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        let valid_hostname = host.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

        if port == 0 || !valid_hostname {
            return Err(invalid());
        }

        Ok(SeedAddr {
            host: host.to_string(),
            port,
        })
    }
}

impl Display for SeedAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl ToSocketAddrs for SeedAddr {
    type Iter = std::vec::IntoIter<SocketAddr>;

    fn to_socket_addrs(&self) -> io::Result<Self::Iter> {
        (self.host.as_str(), self.port).to_socket_addrs()
    }
}

/// Parse a list of `host:port` seeds, failing on the first malformed entry.
pub fn parse_bootstrap_nodes<S: AsRef<str>>(nodes: &[S]) -> Result<Box<[SeedAddr]>> {
    nodes.iter().map(|node| node.as_ref().parse()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_bootstrap_nodes_are_valid() {
        let seeds = parse_bootstrap_nodes(&DEFAULT_BOOTSTRAP_NODES).unwrap();

        assert_eq!(seeds.len(), DEFAULT_BOOTSTRAP_NODES.len());
        assert_eq!(seeds[0].host(), "router.bittorrent.com");
        assert_eq!(seeds[0].port(), 6881);
    }

    #[test]
    fn ip_seeds() {
        let v4: SeedAddr = "127.0.0.1:6881".parse().unwrap();
        assert_eq!(v4.to_string(), "127.0.0.1:6881");

        let v6: SeedAddr = "[2604:a880:1:20::203:d001]:4001".parse().unwrap();
        assert_eq!(v6.host(), "2604:a880:1:20::203:d001");
        assert_eq!(v6.to_string(), "[2604:a880:1:20::203:d001]:4001");
    }

    #[test]
    fn resolves_ip_literals_without_dns() {
        let seed: SeedAddr = "127.0.0.1:6881".parse().unwrap();
        let addresses: Vec<_> = seed.to_socket_addrs().unwrap().collect();

        assert_eq!(addresses, vec![SocketAddr::from(([127, 0, 0, 1], 6881))]);
    }

    #[test]
    fn malformed_seeds() {
        for seed in [
            "",
            "router.bittorrent.com",
            "router.bittorrent.com:",
            "router.bittorrent.com:70000",
            "router.bittorrent.com:0",
            ":6881",
            "bad host:6881",
            "a..b:6881",
            "2604:a880:1:20::203:d001:4001",
        ] {
            assert!(
                matches!(
                    seed.parse::<SeedAddr>(),
                    Err(Error::InvalidBootstrapAddress(_))
                ),
                "{seed:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_fails_on_first_malformed_entry() {
        let result = parse_bootstrap_nodes(&["relay.pkarr.org:6881", "nope"]);

        assert!(matches!(result, Err(Error::InvalidBootstrapAddress(s)) if s == "nope"));
    }
}
