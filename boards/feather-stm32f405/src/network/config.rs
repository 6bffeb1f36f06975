#![deny(unsafe_code)]
#![deny(warnings)]
//! Network configuration structures

use embassy_net::{Ipv4Address, Ipv4Cidr, StaticConfigV4};

/// How the interface obtains its IPv4 address
#[derive(Debug, Clone)]
pub enum Addressing {
    /// Fixed address, prefix length and gateway
    Static {
        address: Ipv4Address,
        prefix_len: u8,
        gateway: Ipv4Address,
    },
    /// Lease from a DHCP server
    Dhcp,
}

/// Network stack configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// MAC address for Ethernet
    pub mac_addr: [u8; 6],
    /// Random seed for network stack
    pub seed: u64,
    pub addressing: Addressing,
    /// Per-connection TCP inactivity timeout in milliseconds
    pub socket_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mac_addr: [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED],
            seed: 0x1234_5678_u64,
            addressing: Addressing::Static {
                address: Ipv4Address::new(192, 168, 1, 8),
                prefix_len: 24,
                gateway: Ipv4Address::new(192, 168, 1, 1),
            },
            socket_timeout_ms: 5000,
        }
    }
}

impl NetworkConfig {
    /// Stack configuration for `embassy_net::new`
    pub fn stack_config(&self) -> embassy_net::Config {
        match self.addressing {
            Addressing::Static {
                address,
                prefix_len,
                gateway,
            } => embassy_net::Config::ipv4_static(StaticConfigV4 {
                address: Ipv4Cidr::new(address, prefix_len),
                gateway: Some(gateway),
                dns_servers: heapless::Vec::new(),
            }),
            Addressing::Dhcp => embassy_net::Config::dhcpv4(Default::default()),
        }
    }
}
