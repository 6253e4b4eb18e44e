use std::net::IpAddr;

use sysinfo::{Networks, System};
use tracing::warn;

use crate::SystemIdentity;

pub fn identity(sys: &System, networks: &Networks) -> SystemIdentity {
    let hostname = match System::host_name() {
        Some(hostname) => hostname,
        None => {
            warn!("host name unavailable, using fallback");
            String::from("unknown")
        }
    };

    SystemIdentity {
        hostname,
        os_name: System::name(),
        platform: System::long_os_version(),
        kernel_version: System::kernel_version(),
        uptime_secs: System::uptime(),
        ip_addresses: non_loopback_ipv4(networks),
        cpu_count: sys.cpus().len(),
        agent_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

pub fn non_loopback_ipv4(networks: &Networks) -> Vec<String> {
    let mut addresses: Vec<String> = networks
        .iter()
        .flat_map(|(_, data)| data.ip_networks())
        .filter_map(|net| match net.addr {
            IpAddr::V4(addr) if !addr.is_loopback() => Some(addr.to_string()),
            _ => None,
        })
        .collect();
    addresses.sort();
    addresses.dedup();
    addresses
}
