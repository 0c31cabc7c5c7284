use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::ProtocolTag;

/// One raw message as received from a device socket.
///
/// Holds the original bytes plus a lossy UTF-8 rendering computed once; the
/// sniffer predicates and the text decoders all work on the rendering.
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct RawFrame {
    bytes: Vec<u8>,
    text: String,
}

impl RawFrame {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            text: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// What a decoded frame represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Position/telemetry report; the only kind that gets enriched
    Data,
    /// Command traffic (acknowledgements, responses)
    Command,
    /// Nothing we recognise, or a claimed frame that failed to decode
    Unknown,
}

/// WGS84 coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

/// Serving cell identity. TZ frames only report LAC/CID; the carrier
/// context (MCC/MNC) comes from configuration in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTower {
    pub mcc: Option<u16>,
    pub mnc: Option<u16>,
    pub lac: u32,
    pub cid: u32,
}

/// How the record's location value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Device GPS fix taken straight from the frame
    Enabled,
    /// No fix and no (successful) triangulation
    Disabled,
    /// Approximate position resolved from the serving cell
    Triangulated,
}

/// Whether a record's timestamp is recent enough to be considered live,
/// plus a human-readable rendering of its age
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub is_current: bool,
    pub age: String,
}

/// The working record threaded through the pipeline.
///
/// Created by a decoder from a [`RawFrame`], then annotated in place by the
/// freshness, location and address stages (in that order) when the kind is
/// [`RecordKind::Data`]. `raw` is never touched after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerRecord {
    /// Original frame text, verbatim
    pub raw: String,
    /// Which registered decoder claimed the frame
    pub protocol: ProtocolTag,
    pub kind: RecordKind,
    /// Extracted device identity (IMEI)
    pub device_id: Option<String>,
    /// Device-reported timestamp
    pub datetime: Option<DateTime<Utc>>,
    pub cell_tower: Option<CellTower>,
    pub location: Option<Position>,
    /// Set by the location stage, and only for data records
    pub location_source: Option<LocationSource>,
    pub address: Option<String>,
    pub freshness: Option<Freshness>,
}

impl TrackerRecord {
    /// The defined degraded result: only `raw` carries information.
    /// Used both for unrecognised frames and for claimed frames whose
    /// decode failed partway.
    pub fn unknown(frame: &RawFrame) -> Self {
        Self {
            raw: frame.text().to_string(),
            protocol: ProtocolTag::Unknown,
            kind: RecordKind::Unknown,
            device_id: None,
            datetime: None,
            cell_tower: None,
            location: None,
            location_source: None,
            address: None,
            freshness: None,
        }
    }

    /// Empty record of a given kind for a claimed frame
    pub fn with_kind(frame: &RawFrame, protocol: ProtocolTag, kind: RecordKind) -> Self {
        Self {
            protocol,
            kind,
            ..Self::unknown(frame)
        }
    }
}
