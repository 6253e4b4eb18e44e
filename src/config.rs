use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_MAX_PROCESSES: usize = 50;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default = "default_broker_host")]
    pub broker_host: String,
    #[serde(default = "default_broker_port")]
    pub broker_port: u16,
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Collection period in seconds. Values <= 0 fall back to the default.
    #[serde(default = "default_interval")]
    pub interval_secs: i64,

    /// Upper bound on processes kept per snapshot. Values <= 0 fall back
    /// to the default.
    #[serde(default = "default_max_processes")]
    pub max_processes: i64,

    /// Gather the open-file path list for selected processes. Off by
    /// default, it means one readlink per descriptor per process.
    #[serde(default)]
    pub collect_open_files: bool,

    #[serde(default)]
    pub critical_files: Vec<PathBuf>,

    #[serde(default)]
    pub system_log: String,
    #[serde(default)]
    pub event_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_host: default_broker_host(),
            broker_port: default_broker_port(),
            topic: default_topic(),
            interval_secs: default_interval(),
            max_processes: default_max_processes(),
            collect_open_files: false,
            critical_files: Vec::new(),
            system_log: String::new(),
            event_log: String::new(),
        }
    }
}

impl Config {
    pub fn interval(&self) -> Duration {
        if self.interval_secs <= 0 {
            Duration::from_secs(DEFAULT_INTERVAL_SECS)
        } else {
            Duration::from_secs(self.interval_secs as u64)
        }
    }

    pub fn max_processes(&self) -> usize {
        if self.max_processes <= 0 {
            DEFAULT_MAX_PROCESSES
        } else {
            self.max_processes as usize
        }
    }

    pub fn system_log(&self) -> PathBuf {
        if self.system_log.is_empty() {
            PathBuf::from("syspulse.log")
        } else {
            PathBuf::from(&self.system_log)
        }
    }

    pub fn event_log(&self) -> PathBuf {
        if self.event_log.is_empty() {
            PathBuf::from("events.log")
        } else {
            PathBuf::from(&self.event_log)
        }
    }
}

fn default_broker_host() -> String {
    String::from("localhost")
}

fn default_broker_port() -> u16 {
    1883
}

fn default_topic() -> String {
    String::from("syspulse/telemetry")
}

fn default_interval() -> i64 {
    DEFAULT_INTERVAL_SECS as i64
}

fn default_max_processes() -> i64 {
    DEFAULT_MAX_PROCESSES as i64
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
