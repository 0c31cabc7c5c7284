use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::CarrierConfig;
use crate::record::{LocationSource, Position, TrackerRecord};

/// Failure modes of a cell-tower geolocation lookup
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("no position known for cell {mcc}/{mnc}/{lac:X}/{cid:X}")]
    NoMatch { mcc: u16, mnc: u16, lac: u32, cid: u32 },
    #[error("geolocation backend error: {0}")]
    Backend(String),
}

/// Resolves an approximate position from a serving-cell identity.
///
/// Network-backed implementations live with the consumer; this crate ships
/// the table-backed [`StaticCellLocator`] for offline deployments and tests.
#[async_trait]
pub trait CellLocator: Send + Sync {
    async fn resolve(&self, mcc: u16, mnc: u16, lac: u32, cid: u32)
        -> Result<Position, LocateError>;
}

/// Cell locator backed by a fixed tower table
pub struct StaticCellLocator {
    towers: HashMap<(u16, u16, u32, u32), Position>,
}

impl StaticCellLocator {
    pub fn new() -> Self {
        Self {
            towers: HashMap::new(),
        }
    }

    pub fn insert(&mut self, mcc: u16, mnc: u16, lac: u32, cid: u32, position: Position) {
        self.towers.insert((mcc, mnc, lac, cid), position);
    }

    /// Build from a configuration table keyed `"mcc:mnc:lac:cid"` (LAC and
    /// CID in hex). Malformed keys are logged and skipped.
    pub fn from_table(table: &HashMap<String, [f64; 2]>) -> Self {
        let mut locator = Self::new();
        for (key, coords) in table {
            match parse_tower_key(key) {
                Some((mcc, mnc, lac, cid)) => {
                    locator.insert(
                        mcc,
                        mnc,
                        lac,
                        cid,
                        Position {
                            lat: coords[0],
                            lon: coords[1],
                        },
                    );
                }
                None => log::warn!("ignoring malformed cell tower key '{}'", key),
            }
        }
        locator
    }
}

impl Default for StaticCellLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CellLocator for StaticCellLocator {
    async fn resolve(
        &self,
        mcc: u16,
        mnc: u16,
        lac: u32,
        cid: u32,
    ) -> Result<Position, LocateError> {
        self.towers
            .get(&(mcc, mnc, lac, cid))
            .copied()
            .ok_or(LocateError::NoMatch { mcc, mnc, lac, cid })
    }
}

fn parse_tower_key(key: &str) -> Option<(u16, u16, u32, u32)> {
    let mut parts = key.split(':');
    let mcc = parts.next()?.parse().ok()?;
    let mnc = parts.next()?.parse().ok()?;
    let lac = u32::from_str_radix(parts.next()?, 16).ok()?;
    let cid = u32::from_str_radix(parts.next()?, 16).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((mcc, mnc, lac, cid))
}

/// Location stage of the pipeline.
///
/// Best effort by contract: a record with a device GPS fix is tagged
/// `enabled` and left alone; one without a fix is tagged `disabled` and, if
/// it names a serving cell, a triangulation is attempted against the
/// configured carrier context. Lookup failures are logged and swallowed;
/// this stage never fails the pipeline.
pub struct LocationEnricher {
    locator: Arc<dyn CellLocator>,
    carrier: CarrierConfig,
}

impl LocationEnricher {
    pub fn new(locator: Arc<dyn CellLocator>, carrier: CarrierConfig) -> Self {
        Self { locator, carrier }
    }

    pub async fn enrich(&self, record: &mut TrackerRecord) {
        if record.location.is_some() {
            record.location_source = Some(LocationSource::Enabled);
            return;
        }
        record.location_source = Some(LocationSource::Disabled);

        let Some(tower) = record.cell_tower else {
            return;
        };
        // Frames that don't report their carrier fall back to the
        // configured network
        let mcc = tower.mcc.unwrap_or(self.carrier.mcc);
        let mnc = tower.mnc.unwrap_or(self.carrier.mnc);

        match self.locator.resolve(mcc, mnc, tower.lac, tower.cid).await {
            Ok(position) => {
                debug!(
                    "triangulated {:?} to {:.5}, {:.5}",
                    record.device_id, position.lat, position.lon
                );
                record.location = Some(position);
                record.location_source = Some(LocationSource::Triangulated);
            }
            Err(err) => {
                warn!("triangulation failed, leaving location disabled: {}", err);
            }
        }
    }
}
