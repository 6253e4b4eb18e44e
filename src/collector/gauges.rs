use std::path::Path;

use sysinfo::{Components, Disks, System};
use tracing::warn;

pub fn cpu_percent(sys: &System) -> f32 {
    sys.global_cpu_usage().max(0.0)
}

pub fn memory_percent(sys: &System) -> f32 {
    let total = sys.total_memory();
    if total == 0 {
        warn!("total memory reported as zero");
        return 0.0;
    }
    (sys.used_memory() as f64 / total as f64 * 100.0) as f32
}

/// Used space of the root filesystem. Falls back to the first reported
/// disk when nothing is mounted at `/`.
pub fn disk_percent(disks: &Disks) -> f32 {
    let root = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first());
    let Some(disk) = root else {
        warn!("no disks reported, root utilization unknown");
        return 0.0;
    };

    let total = disk.total_space();
    if total == 0 {
        return 0.0;
    }
    let used = total.saturating_sub(disk.available_space());
    (used as f64 / total as f64 * 100.0) as f32
}

/// First sensor with a reading; absent when there are no sensors or none
/// of them report.
pub fn temperature(components: &Components) -> Option<f32> {
    components
        .iter()
        .find_map(|component| component.temperature())
}
