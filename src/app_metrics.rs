use serde::Serialize;
use tracing::info;

/// Application-level metrics for tracking frame ingest and pipeline
/// statistics (not device telemetry itself). Counters are cumulative for
/// the process lifetime; the router logs a snapshot once a minute.
#[derive(Debug, Clone, Serialize)]
pub struct RouterMetrics {
    /// Number of raw frames received from device connections
    pub frames_received: u64,
    /// Number of frames decoded into data records
    pub data_records: u64,
    /// Number of frames decoded into command traffic
    pub command_records: u64,
    /// Number of frames no registered decoder claimed (or that failed decode)
    pub unknown_frames: u64,
    /// Number of records positioned by cell-tower triangulation
    pub triangulated_fixes: u64,
    /// Number of pipeline runs failed by the address stage
    pub geocode_failures: u64,
    /// Number of device connection IO errors
    pub io_errors: u64,
}

impl RouterMetrics {
    /// Create a new RouterMetrics instance with all counters at zero
    pub fn new() -> Self {
        Self {
            frames_received: 0,
            data_records: 0,
            command_records: 0,
            unknown_frames: 0,
            triangulated_fixes: 0,
            geocode_failures: 0,
            io_errors: 0,
        }
    }

    /// Log current metrics to the info log
    pub fn log(&self) {
        info!(
            "[Metrics] Frames: {}, Data: {}, Commands: {}, Unknown: {}, Triangulated: {}, Geocode failures: {}, IO errors: {}",
            self.frames_received,
            self.data_records,
            self.command_records,
            self.unknown_frames,
            self.triangulated_fixes,
            self.geocode_failures,
            self.io_errors
        );
    }
}

impl Default for RouterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
