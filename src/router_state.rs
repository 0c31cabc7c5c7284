use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::app_metrics::RouterMetrics;
use crate::record::TrackerRecord;

/// Shared state of the router binary: ingest metrics plus the last record
/// seen per device. One instance behind a lock, written by the ingest
/// tasks and read by the status web API.
#[derive(Debug)]
pub struct RouterState {
    pub started_at: DateTime<Utc>,
    pub metrics: RouterMetrics,
    last_records: HashMap<String, TrackerRecord>,
}

impl RouterState {
    pub fn new() -> Self {
        RouterState {
            started_at: Utc::now(),
            metrics: RouterMetrics::new(),
            last_records: HashMap::new(),
        }
    }

    /// Remember the latest record for its device. Records without a device
    /// identity (unknown frames) are not tracked here.
    pub fn update_record(&mut self, record: &TrackerRecord) {
        if let Some(device_id) = &record.device_id {
            self.last_records.insert(device_id.clone(), record.clone());
        }
    }

    pub fn devices_seen(&self) -> usize {
        self.last_records.len()
    }

    pub fn last_records(&self) -> impl Iterator<Item = &TrackerRecord> {
        self.last_records.values()
    }
}

impl Default for RouterState {
    fn default() -> Self {
        Self::new()
    }
}
