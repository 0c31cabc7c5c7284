use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub carrier: CarrierConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub logging: LogConfig,
    /// Known cell towers for the table-backed locator.
    /// Keyed "mcc:mnc:lac:cid" with LAC/CID in hex.
    #[serde(default)]
    pub cell_towers: HashMap<String, [f64; 2]>,
    /// Known places for the table-backed geocoder.
    /// Keyed "lat,lon" rounded to four decimals.
    #[serde(default)]
    pub places: HashMap<String, String>,
}

/// Carrier context used when a frame names a serving cell but not the
/// network it belongs to (the TZ family never reports MCC/MNC)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub mcc: u16,
    pub mnc: u16,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self { mcc: 730, mnc: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Address the device listener binds to
    pub bind: String,
    pub port: u16,
    /// Connections silent for longer than this are dropped
    pub idle_timeout_seconds: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5020,
            idle_timeout_seconds: 300,
        }
    }
}

impl ListenerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory where log files will be stored
    pub directory: String,
    /// Log file name prefix (date will be appended)
    pub file_prefix: String,
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: "./logs".to_string(),
            file_prefix: "tracker_router".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            carrier: CarrierConfig::default(),
            listener: ListenerConfig::default(),
            web: WebConfig::default(),
            logging: LogConfig::default(),
            cell_towers: HashMap::new(),
            places: HashMap::new(),
        }
    }
}
