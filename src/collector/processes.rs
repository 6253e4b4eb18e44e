//! Process enumeration, CPU ranking, and per-process field gathering.
//!
//! Every process handle may go stale between enumeration and sampling: a
//! vanished process is skipped, and any single field that cannot be read
//! becomes its zero/absent value without dropping the record.

use std::cmp::Ordering;

use sysinfo::{Pid, Process, System};

use crate::ProcessRecord;

/// Stable CPU-descending ranking over `(pid, cpu)` candidates; ties keep
/// the order the candidates arrived in. Returns at most `max` pids.
pub fn top_by_cpu(mut candidates: Vec<(u32, f32)>, max: usize) -> Vec<u32> {
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    candidates.truncate(max);
    candidates.into_iter().map(|(pid, _)| pid).collect()
}

pub fn sample(sys: &System, max: usize, collect_open_files: bool) -> Vec<ProcessRecord> {
    let mut candidates: Vec<(u32, f32)> = sys
        .processes()
        .iter()
        .map(|(pid, process)| (pid.as_u32(), process.cpu_usage()))
        .collect();
    // the process map iterates in arbitrary order; pin it by pid so the
    // ranking's tie-break is reproducible
    candidates.sort_by_key(|(pid, _)| *pid);

    let total_memory = sys.total_memory();

    top_by_cpu(candidates, max)
        .into_iter()
        // a process that exited since enumeration is skipped, not an error
        .filter_map(|pid| sys.process(Pid::from_u32(pid)))
        .map(|process| record(process, total_memory, collect_open_files))
        .collect()
}

fn record(process: &Process, total_memory: u64, collect_open_files: bool) -> ProcessRecord {
    let pid = process.pid().as_u32();
    let rss_bytes = process.memory();
    let memory_percent = if total_memory == 0 {
        0.0
    } else {
        (rss_bytes as f64 / total_memory as f64 * 100.0) as f32
    };
    let disk_usage = process.disk_usage();

    ProcessRecord {
        pid,
        name: process.name().to_string_lossy().into_owned(),
        command: process
            .cmd()
            .iter()
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" "),
        cpu_percent: process.cpu_usage().max(0.0),
        memory_percent,
        rss_bytes,
        vms_bytes: process.virtual_memory(),
        status: process.status().to_string(),
        started_at: process.start_time(),
        threads: process.tasks().map_or(0, |tasks| tasks.len()),
        fd_count: fd_count(pid),
        read_bytes: disk_usage.total_read_bytes,
        written_bytes: disk_usage.total_written_bytes,
        open_files: if collect_open_files {
            open_file_paths(pid)
        } else {
            None
        },
    }
}

#[cfg(target_os = "linux")]
fn fd_count(pid: u32) -> Option<u64> {
    let entries = std::fs::read_dir(format!("/proc/{pid}/fd")).ok()?;
    Some(entries.count() as u64)
}

#[cfg(not(target_os = "linux"))]
fn fd_count(_pid: u32) -> Option<u64> {
    None
}

#[cfg(target_os = "linux")]
fn open_file_paths(pid: u32) -> Option<Vec<String>> {
    let entries = std::fs::read_dir(format!("/proc/{pid}/fd")).ok()?;
    let mut paths: Vec<String> = entries
        .flatten()
        .filter_map(|entry| std::fs::read_link(entry.path()).ok())
        .map(|target| target.to_string_lossy().into_owned())
        .filter(|target| target.starts_with('/'))
        .collect();
    paths.sort();
    Some(paths)
}

#[cfg(not(target_os = "linux"))]
fn open_file_paths(_pid: u32) -> Option<Vec<String>> {
    None
}
