pub mod actors;
pub mod collector;
pub mod config;
pub mod format;
pub mod journal;
pub mod transport;
pub mod util;

use serde::{Deserialize, Serialize};

/// One point-in-time snapshot of the host, assembled once per collection
/// cycle. Immutable after construction; this is the unit of transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTelemetry {
    /// Seconds since the Unix epoch at assembly time.
    pub timestamp: i64,
    pub system: SystemIdentity,
    pub hardware: HardwareGauges,
    pub network: NetworkOverview,
    pub processes: Vec<ProcessRecord>,
    pub critical_files: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemIdentity {
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub os_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kernel_version: Option<String>,
    pub uptime_secs: u64,
    /// Non-loopback IPv4 addresses of the host.
    pub ip_addresses: Vec<String>,
    pub cpu_count: usize,
    pub agent_version: String,
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self {
            hostname: String::from("unknown"),
            os_name: None,
            platform: None,
            kernel_version: None,
            uptime_secs: 0,
            ip_addresses: Vec::new(),
            cpu_count: 0,
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HardwareGauges {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    /// Used space of the root filesystem, in percent.
    pub disk_percent: f32,
    /// Absent (not zero) when no sensor reading was available.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NetworkOverview {
    pub interfaces: Vec<InterfaceStats>,
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub connections: Vec<ConnectionInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    pub name: String,
    pub ips: Vec<String>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mac: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// One of "tcp", "udp", "unix" or "unknown".
    pub protocol: String,
    pub local_addr: String,
    pub remote_addr: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub command: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub rss_bytes: u64,
    pub vms_bytes: u64,
    pub status: String,
    /// Process creation time, seconds since the Unix epoch.
    pub started_at: u64,
    pub threads: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fd_count: Option<u64>,
    pub read_bytes: u64,
    pub written_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub open_files: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub size_bytes: u64,
    pub modified_at: i64,
}
