use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::decoders::{Avl05Decoder, Avl08Decoder, Avl201Decoder, Mvt380Decoder, TzAckDecoder};
use crate::record::{RawFrame, TrackerRecord};

/// Identifies which registered decoder owns a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolTag {
    TzAvl05,
    TzAvl08,
    TzAvl201,
    /// TZ command acknowledgement (`Receive:'...'`); not tied to one AVL variant
    TzAck,
    MeitrackMvt380,
    Unknown,
}

/// Protocol families, for family-level dispatch (command encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    Tz,
    Meitrack,
}

impl ProtocolTag {
    pub fn family(&self) -> Option<DeviceFamily> {
        match self {
            ProtocolTag::TzAvl05
            | ProtocolTag::TzAvl08
            | ProtocolTag::TzAvl201
            | ProtocolTag::TzAck => Some(DeviceFamily::Tz),
            ProtocolTag::MeitrackMvt380 => Some(DeviceFamily::Meitrack),
            ProtocolTag::Unknown => None,
        }
    }
}

/// One registered protocol variant: a cheap claim predicate plus the decoder
/// behind it.
///
/// Implementations must not panic on malformed input; a frame that fails to
/// decode despite a positive claim degrades to an unknown-kind record.
pub trait FrameDecoder: Send + Sync {
    fn tag(&self) -> ProtocolTag;

    /// Cheap syntactic test; no field values are decoded
    fn claims(&self, frame: &RawFrame) -> bool;

    /// Full field decode into a normalized record
    fn decode(&self, frame: &RawFrame) -> TrackerRecord;

    /// Pull the device identity without a full decode, when the frame shape
    /// allows it cheaply
    fn device_id(&self, frame: &RawFrame) -> Option<String>;
}

/// Ordered collection of protocol decoders.
///
/// Decoders are tried in registration order and the first positive claim
/// wins, so more specific shapes must be registered before broader ones.
/// New variants plug in through [`DecoderRegistry::register`] without
/// touching the pipeline.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn FrameDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Registry with the built-in protocol set, in sniffing priority order:
    /// the three TZ AVL data variants, TZ acknowledgements, then Meitrack.
    pub fn with_default_protocols() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Avl05Decoder));
        registry.register(Box::new(Avl08Decoder));
        registry.register(Box::new(Avl201Decoder));
        registry.register(Box::new(TzAckDecoder));
        registry.register(Box::new(Mvt380Decoder));
        registry
    }

    pub fn register(&mut self, decoder: Box<dyn FrameDecoder>) {
        self.decoders.push(decoder);
    }

    /// Which registered variant claims this frame, if any.
    /// Side-effect-free; unknown is an expected outcome, not an error.
    pub fn identify(&self, frame: &RawFrame) -> ProtocolTag {
        self.decoders
            .iter()
            .find(|d| d.claims(frame))
            .map(|d| d.tag())
            .unwrap_or(ProtocolTag::Unknown)
    }

    /// Decode a frame with the first claiming decoder. Unclaimed frames
    /// yield the degraded only-`raw` record.
    pub fn decode(&self, frame: &RawFrame) -> TrackerRecord {
        match self.decoders.iter().find(|d| d.claims(frame)) {
            Some(decoder) => decoder.decode(frame),
            None => TrackerRecord::unknown(frame),
        }
    }

    /// Device identity via the cheap per-protocol extraction, no decoding
    pub fn extract_device_id(&self, frame: &RawFrame) -> Option<String> {
        self.decoders
            .iter()
            .find(|d| d.claims(frame))
            .and_then(|d| d.device_id(frame))
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_default_protocols()
    }
}

/// Extract the device identity from a raw frame using the built-in protocol
/// set. Pure local extraction: no enrichment, no external calls.
pub fn extract_device_id(raw: &[u8]) -> Option<String> {
    static REGISTRY: OnceLock<DecoderRegistry> = OnceLock::new();
    let registry = REGISTRY.get_or_init(DecoderRegistry::with_default_protocols);
    registry.extract_device_id(&RawFrame::new(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    const AVL05_SAMPLE: &[u8] = b"$$B6869444005480041|91$GPRMC,194329.000,A,3321.6735,S,07030.7640,W,0.00,0.00,090216,,,A*6C|02.1|01.3|01.7|000000000000|20160209194326|13981188|00000000|32D3A03F|0000|0.6376|0100|7B20\r\n";

    #[test]
    fn test_identify_sample_frames() {
        let registry = DecoderRegistry::with_default_protocols();
        assert_eq!(
            registry.identify(&RawFrame::new(AVL05_SAMPLE)),
            ProtocolTag::TzAvl05
        );
        assert_eq!(
            registry.identify(&RawFrame::new(b"Receive:'002'|869444005480041|OK\r\n")),
            ProtocolTag::TzAck
        );
        assert_eq!(
            registry.identify(&RawFrame::new(b"gibberish")),
            ProtocolTag::Unknown
        );
        assert_eq!(
            registry.identify(&RawFrame::new(b"")),
            ProtocolTag::Unknown
        );
    }

    #[test]
    fn test_decode_unclaimed_frame_degrades() {
        let registry = DecoderRegistry::with_default_protocols();
        let record = registry.decode(&RawFrame::new(b"NOT A TRACKER FRAME\r\n"));
        assert_eq!(record.kind, RecordKind::Unknown);
        assert_eq!(record.protocol, ProtocolTag::Unknown);
        assert_eq!(record.raw, "NOT A TRACKER FRAME\r\n");
        assert!(record.device_id.is_none());
    }

    #[test]
    fn test_extract_device_id_standalone() {
        assert_eq!(
            extract_device_id(AVL05_SAMPLE),
            Some("869444005480041".to_string())
        );
        assert_eq!(extract_device_id(b"gibberish"), None);
    }

    #[test]
    fn test_registration_order_is_priority_order() {
        // A registry with only the broader AVL08 shape registered first
        // still never steals AVL05 frames: the shapes are disjoint.
        let mut registry = DecoderRegistry::new();
        registry.register(Box::new(Avl08Decoder));
        registry.register(Box::new(Avl05Decoder));
        assert_eq!(
            registry.identify(&RawFrame::new(AVL05_SAMPLE)),
            ProtocolTag::TzAvl05
        );
    }

    #[test]
    fn test_tag_families() {
        assert_eq!(ProtocolTag::TzAvl08.family(), Some(DeviceFamily::Tz));
        assert_eq!(ProtocolTag::TzAck.family(), Some(DeviceFamily::Tz));
        assert_eq!(
            ProtocolTag::MeitrackMvt380.family(),
            Some(DeviceFamily::Meitrack)
        );
        assert_eq!(ProtocolTag::Unknown.family(), None);
    }
}
