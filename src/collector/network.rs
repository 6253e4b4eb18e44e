//! Interface counters and the active-connection table.
//!
//! Interface statistics come from sysinfo; aggregate totals are the sums
//! over the per-interface counters. The connection table is read from the
//! kernel's socket tables on Linux and is empty elsewhere.

use sysinfo::{MacAddr, Networks, System};

use crate::{ConnectionInfo, InterfaceStats, NetworkOverview};

pub fn overview(networks: &Networks, sys: &System) -> NetworkOverview {
    let interfaces = interface_stats(networks);
    let (total_bytes_sent, total_bytes_received) = totals(&interfaces);

    NetworkOverview {
        interfaces,
        total_bytes_sent,
        total_bytes_received,
        connections: connections(sys),
    }
}

/// Aggregate (sent, received) over the per-interface counters.
pub fn totals(interfaces: &[InterfaceStats]) -> (u64, u64) {
    (
        interfaces.iter().map(|i| i.bytes_sent).sum(),
        interfaces.iter().map(|i| i.bytes_received).sum(),
    )
}

pub fn interface_stats(networks: &Networks) -> Vec<InterfaceStats> {
    let mut stats: Vec<InterfaceStats> = networks
        .iter()
        .map(|(name, data)| InterfaceStats {
            name: name.clone(),
            ips: data
                .ip_networks()
                .iter()
                .map(|net| net.addr.to_string())
                .collect(),
            bytes_sent: data.total_transmitted(),
            bytes_received: data.total_received(),
            mac: Some(data.mac_address())
                .filter(|mac| *mac != MacAddr::UNSPECIFIED)
                .map(|mac| mac.to_string()),
        })
        .collect();
    stats.sort_by(|a, b| a.name.cmp(&b.name));
    stats
}

pub fn connections(sys: &System) -> Vec<ConnectionInfo> {
    #[cfg(target_os = "linux")]
    {
        proc_net::connections(sys)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = sys;
        Vec::new()
    }
}

/// Socket kinds map onto a small fixed protocol vocabulary.
pub fn protocol_name(raw: &str) -> &'static str {
    match raw {
        "tcp" | "tcp6" => "tcp",
        "udp" | "udp6" => "udp",
        "unix" => "unix",
        _ => "unknown",
    }
}

#[cfg(target_os = "linux")]
mod proc_net {
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use sysinfo::System;
    use tracing::warn;

    use super::protocol_name;
    use crate::ConnectionInfo;

    const TABLES: [&str; 4] = ["tcp", "tcp6", "udp", "udp6"];

    pub fn connections(sys: &System) -> Vec<ConnectionInfo> {
        let owners = socket_owners(sys);
        let mut connections = Vec::new();
        for table in TABLES {
            let path = format!("/proc/net/{table}");
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    connections.extend(parse_table(&content, protocol_name(table), &owners));
                }
                Err(e) => warn!("skipping {path}: {e}"),
            }
        }
        connections
    }

    /// Socket inode to owning PID, built by walking the fd tables of the
    /// enumerated processes. Unreadable fd dirs are silently skipped.
    fn socket_owners(sys: &System) -> HashMap<u64, u32> {
        let mut owners = HashMap::new();
        for pid in sys.processes().keys() {
            let pid = pid.as_u32();
            let Ok(entries) = std::fs::read_dir(format!("/proc/{pid}/fd")) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(target) = std::fs::read_link(entry.path()) else {
                    continue;
                };
                let target = target.to_string_lossy();
                if let Some(inode) = target
                    .strip_prefix("socket:[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    && let Ok(inode) = inode.parse::<u64>()
                {
                    owners.insert(inode, pid);
                }
            }
        }
        owners
    }

    fn parse_table(
        content: &str,
        protocol: &'static str,
        owners: &HashMap<u64, u32>,
    ) -> Vec<ConnectionInfo> {
        content
            .lines()
            .skip(1)
            .filter_map(|line| parse_row(line, protocol, owners))
            .collect()
    }

    fn parse_row(
        line: &str,
        protocol: &'static str,
        owners: &HashMap<u64, u32>,
    ) -> Option<ConnectionInfo> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            return None;
        }

        let local_addr = decode_socket_addr(fields[1])?;
        let remote_addr = decode_socket_addr(fields[2])?;
        // rows without a recognizable state are not yet established
        let status = state_name(fields[3])?;
        let pid = fields[9]
            .parse::<u64>()
            .ok()
            .and_then(|inode| owners.get(&inode).copied());

        Some(ConnectionInfo {
            protocol: protocol.to_string(),
            local_addr,
            remote_addr,
            status: status.to_string(),
            pid,
        })
    }

    fn decode_socket_addr(raw: &str) -> Option<String> {
        let (ip_hex, port_hex) = raw.split_once(':')?;
        let port = u16::from_str_radix(port_hex, 16).ok()?;
        let ip = decode_ip(ip_hex)?;
        Some(format!("{ip}:{port}"))
    }

    /// The kernel prints socket addresses as little-endian 32-bit words.
    fn decode_ip(hex: &str) -> Option<IpAddr> {
        match hex.len() {
            8 => {
                let raw = u32::from_str_radix(hex, 16).ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(raw.swap_bytes())))
            }
            32 => {
                let mut bytes = [0u8; 16];
                for (i, chunk) in hex.as_bytes().chunks(8).enumerate() {
                    let chunk = std::str::from_utf8(chunk).ok()?;
                    let word = u32::from_str_radix(chunk, 16).ok()?;
                    bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
                }
                Some(IpAddr::V6(Ipv6Addr::from(bytes)))
            }
            _ => None,
        }
    }

    fn state_name(hex: &str) -> Option<&'static str> {
        match u8::from_str_radix(hex, 16).ok()? {
            0x01 => Some("ESTABLISHED"),
            0x02 => Some("SYN_SENT"),
            0x03 => Some("SYN_RECV"),
            0x04 => Some("FIN_WAIT1"),
            0x05 => Some("FIN_WAIT2"),
            0x06 => Some("TIME_WAIT"),
            0x07 => Some("CLOSE"),
            0x08 => Some("CLOSE_WAIT"),
            0x09 => Some("LAST_ACK"),
            0x0A => Some("LISTEN"),
            0x0B => Some("CLOSING"),
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use pretty_assertions::assert_eq;

        // header + one sshd LISTEN row, shaped like the real table
        const TCP_SAMPLE: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n   0: 0100007F:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345 1 0000000000000000 100 0 0 10 0\n";

        #[test]
        fn parses_a_listen_row() {
            let mut owners = HashMap::new();
            owners.insert(12345u64, 999u32);

            let rows = parse_table(TCP_SAMPLE, "tcp", &owners);

            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].protocol, "tcp");
            assert_eq!(rows[0].local_addr, "127.0.0.1:22");
            assert_eq!(rows[0].remote_addr, "0.0.0.0:0");
            assert_eq!(rows[0].status, "LISTEN");
            assert_eq!(rows[0].pid, Some(999));
        }

        #[test]
        fn unknown_state_rows_are_dropped() {
            let sample = TCP_SAMPLE.replace(" 0A ", " FF ");

            let rows = parse_table(&sample, "tcp", &HashMap::new());

            assert!(rows.is_empty());
        }

        #[test]
        fn unowned_sockets_have_no_pid() {
            let rows = parse_table(TCP_SAMPLE, "tcp", &HashMap::new());

            assert_eq!(rows[0].pid, None);
        }

        #[test]
        fn decodes_ipv4_words() {
            assert_eq!(
                decode_ip("0100007F"),
                Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
            );
        }

        #[test]
        fn decodes_ipv6_words() {
            assert_eq!(
                decode_ip("00000000000000000000000001000000"),
                Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
            );
        }

        #[test]
        fn malformed_addresses_are_rejected() {
            assert_eq!(decode_ip("zz00007F"), None);
            assert_eq!(decode_ip("0100"), None);
        }
    }
}
