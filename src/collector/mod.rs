//! Snapshot assembly: one [`SystemTelemetry`] per invocation, tolerating
//! the independent failure of any single metric source.
//!
//! Each adapter queries one OS facility and degrades on its own: a failing
//! source is logged and its fields stay at their zero/absent value, the
//! rest of the snapshot is unaffected. The collector never fails as a
//! whole; the worst case is a snapshot carrying little more than its
//! timestamp.

pub mod files;
pub mod gauges;
pub mod host;
pub mod network;
pub mod processes;

use std::path::PathBuf;

use chrono::Utc;
use sysinfo::{Components, Disks, Networks, System};
use tracing::trace;

use crate::config::Config;
use crate::{HardwareGauges, SystemTelemetry};

pub struct SnapshotCollector {
    sys: System,
    networks: Networks,
    disks: Disks,
    components: Components,
    max_processes: usize,
    collect_open_files: bool,
    critical_files: Vec<PathBuf>,
}

impl SnapshotCollector {
    /// Set up the sysinfo handles and take a warm-up sample so the first
    /// cycle's CPU percentages are measured against a real baseline
    /// instead of a meaningless single-point artifact. Blocks for
    /// [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`] once, at startup.
    pub fn new(config: &Config) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_all();

        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            max_processes: config.max_processes(),
            collect_open_files: config.collect_open_files,
            critical_files: config.critical_files.clone(),
        }
    }

    /// Assemble one snapshot. The long-lived handles carry the previous
    /// cycle's readings, so per-process CPU percentages reflect the window
    /// since the last collection.
    pub fn collect(&mut self) -> SystemTelemetry {
        self.sys.refresh_all();
        self.networks.refresh(true);
        self.disks.refresh(true);
        self.components.refresh(true);

        let system = host::identity(&self.sys, &self.networks);
        let hardware = HardwareGauges {
            cpu_percent: gauges::cpu_percent(&self.sys),
            memory_percent: gauges::memory_percent(&self.sys),
            disk_percent: gauges::disk_percent(&self.disks),
            temperature: gauges::temperature(&self.components),
        };
        let network = network::overview(&self.networks, &self.sys);
        let processes = processes::sample(&self.sys, self.max_processes, self.collect_open_files);
        let critical_files = self
            .critical_files
            .iter()
            .filter_map(|path| files::stat(path))
            .collect();

        let telemetry = SystemTelemetry {
            timestamp: Utc::now().timestamp(),
            system,
            hardware,
            network,
            processes,
            critical_files,
        };

        trace!(
            "assembled snapshot: {} processes, {} interfaces, {} files",
            telemetry.processes.len(),
            telemetry.network.interfaces.len(),
            telemetry.critical_files.len()
        );

        telemetry
    }
}
