//! Pure rendering of a [`SystemTelemetry`] value into human-readable text.
//!
//! Everything in here is side-effect free: the subscriber uses
//! [`render_report`] for the full report and [`event_block`] /
//! [`summary_line`] for the event trail, all over the same snapshot.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::SystemTelemetry;

/// Width the process name column is truncated to.
const NAME_WIDTH: usize = 20;

/// Processes shown in an event-trail block.
const EVENT_BLOCK_PROCESSES: usize = 5;

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Binary-prefix byte count, one decimal place from KB upwards, scaled so
/// the magnitude stays below 1024.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    // one-decimal rounding may carry into the next unit
    if value >= 1023.95 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

/// Days/hours/minutes/seconds, sub-day fields always zero-padded to two
/// digits. The day field is omitted when zero.
pub fn format_duration(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days:02}d {hours:02}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{hours:02}h {minutes:02}m {seconds:02}s")
    }
}

fn format_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("@{secs}"))
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        name.chars().take(width).collect()
    }
}

fn os_summary(telemetry: &SystemTelemetry) -> String {
    let system = &telemetry.system;
    let os = system.os_name.as_deref().unwrap_or("unknown");
    let kernel = system.kernel_version.as_deref().unwrap_or("unknown");
    format!("{os} (kernel {kernel})")
}

/// The full multi-section report shown on the subscriber's primary output.
pub fn render_report(telemetry: &SystemTelemetry) -> String {
    let mut out = String::new();
    let system = &telemetry.system;
    let hardware = &telemetry.hardware;
    let network = &telemetry.network;

    let _ = writeln!(out, "==================================================");
    let _ = writeln!(
        out,
        "Telemetry for {} at {}",
        system.hostname,
        format_timestamp(telemetry.timestamp)
    );
    let _ = writeln!(out, "==================================================");

    let _ = writeln!(out, "[system]");
    let _ = writeln!(out, "  os:       {}", os_summary(telemetry));
    if let Some(platform) = &system.platform {
        let _ = writeln!(out, "  platform: {platform}");
    }
    let _ = writeln!(out, "  uptime:   {}", format_duration(system.uptime_secs));
    let _ = writeln!(out, "  cpus:     {}", system.cpu_count);
    let _ = writeln!(out, "  agent:    v{}", system.agent_version);
    if !system.ip_addresses.is_empty() {
        let _ = writeln!(out, "  ips:      {}", system.ip_addresses.join(", "));
    }

    let _ = writeln!(out, "[hardware]");
    let _ = write!(
        out,
        "  cpu {:.1}% | mem {:.1}% | disk {:.1}%",
        hardware.cpu_percent, hardware.memory_percent, hardware.disk_percent
    );
    match hardware.temperature {
        Some(temp) => {
            let _ = writeln!(out, " | temp {temp:.1}C");
        }
        None => {
            let _ = writeln!(out, " | temp n/a");
        }
    }

    let _ = writeln!(out, "[network]");
    let _ = writeln!(
        out,
        "  sent {} / received {} across {} interfaces",
        format_bytes(network.total_bytes_sent),
        format_bytes(network.total_bytes_received),
        network.interfaces.len()
    );
    if !network.connections.is_empty() {
        let _ = writeln!(
            out,
            "  {:<5} {:<25} {:<25} {:<12} PID",
            "PROTO", "LOCAL", "REMOTE", "STATUS"
        );
        for conn in &network.connections {
            let pid = conn
                .pid
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| String::from("-"));
            let _ = writeln!(
                out,
                "  {:<5} {:<25} {:<25} {:<12} {pid}",
                conn.protocol,
                truncate(&conn.local_addr, 25),
                truncate(&conn.remote_addr, 25),
                conn.status,
            );
        }
    }

    let _ = writeln!(out, "[processes]");
    let _ = writeln!(
        out,
        "  {:>7} {:<NAME_WIDTH$} {:>6} {:>6} {:>10} {:>4} {:>21} STATUS",
        "PID", "NAME", "CPU%", "MEM%", "RSS", "THR", "IO R/W"
    );
    for process in &telemetry.processes {
        let _ = writeln!(
            out,
            "  {:>7} {:<NAME_WIDTH$} {:>6.1} {:>6.1} {:>10} {:>4} {:>10}/{:>10} {}",
            process.pid,
            truncate(&process.name, NAME_WIDTH),
            process.cpu_percent,
            process.memory_percent,
            format_bytes(process.rss_bytes),
            process.threads,
            format_bytes(process.read_bytes),
            format_bytes(process.written_bytes),
            process.status,
        );
    }

    if !telemetry.critical_files.is_empty() {
        let _ = writeln!(out, "[files]");
        for file in &telemetry.critical_files {
            let _ = writeln!(
                out,
                "  {} ({}, modified {})",
                file.path,
                format_bytes(file.size_bytes),
                format_timestamp(file.modified_at)
            );
        }
    }

    out
}

/// The multi-line block appended to the event trail for each snapshot.
pub fn event_block(telemetry: &SystemTelemetry) -> String {
    let mut out = String::new();
    let system = &telemetry.system;
    let hardware = &telemetry.hardware;
    let network = &telemetry.network;

    let _ = writeln!(
        out,
        "--- snapshot from {} at {} ---",
        system.hostname,
        format_timestamp(telemetry.timestamp)
    );
    let _ = writeln!(out, "os: {}", os_summary(telemetry));
    let _ = writeln!(out, "uptime: {}", format_duration(system.uptime_secs));
    let _ = writeln!(
        out,
        "gauges: cpu {:.1}% mem {:.1}% disk {:.1}%",
        hardware.cpu_percent, hardware.memory_percent, hardware.disk_percent
    );
    let _ = writeln!(
        out,
        "network: sent {} received {}",
        format_bytes(network.total_bytes_sent),
        format_bytes(network.total_bytes_received)
    );
    for process in telemetry.processes.iter().take(EVENT_BLOCK_PROCESSES) {
        let _ = writeln!(
            out,
            "  [{}] {} cpu {:.1}% mem {:.1}%",
            process.pid,
            truncate(&process.name, NAME_WIDTH),
            process.cpu_percent,
            process.memory_percent,
        );
    }

    out
}

/// The condensed one-line summary appended after each event block.
pub fn summary_line(telemetry: &SystemTelemetry) -> String {
    format!(
        "{} {} cpu={:.1}% mem={:.1}% disk={:.1}% procs={}\n",
        format_timestamp(telemetry.timestamp),
        telemetry.system.hostname,
        telemetry.hardware.cpu_percent,
        telemetry.hardware.memory_percent,
        telemetry.hardware.disk_percent,
        telemetry.processes.len(),
    )
}
