//! Helper functions for integration tests

use syspulse::{HardwareGauges, NetworkOverview, SystemIdentity, SystemTelemetry};

pub fn make_telemetry(hostname: &str) -> SystemTelemetry {
    SystemTelemetry {
        timestamp: 1_700_000_000,
        system: SystemIdentity {
            hostname: hostname.to_string(),
            os_name: Some(String::from("TestOS")),
            kernel_version: Some(String::from("6.1.0")),
            uptime_secs: 3_600,
            cpu_count: 4,
            ..SystemIdentity::default()
        },
        hardware: HardwareGauges {
            cpu_percent: 25.0,
            memory_percent: 50.0,
            disk_percent: 75.0,
            temperature: None,
        },
        network: NetworkOverview::default(),
        processes: Vec::new(),
        critical_files: Vec::new(),
    }
}

pub fn encode(telemetry: &SystemTelemetry) -> Vec<u8> {
    serde_json::to_vec(telemetry).unwrap()
}

/// Poll a predicate on the journal file until it holds or the deadline
/// passes. Returns the final contents.
pub async fn wait_for_journal(
    path: &std::path::Path,
    predicate: impl Fn(&str) -> bool,
) -> String {
    for _ in 0..100 {
        let contents = std::fs::read_to_string(path).unwrap_or_default();
        if predicate(&contents) {
            return contents;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    std::fs::read_to_string(path).unwrap_or_default()
}
