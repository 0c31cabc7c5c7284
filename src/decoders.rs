use tracing::{debug, warn};

use crate::record::{CellTower, Position, RawFrame, RecordKind, TrackerRecord};
use crate::registry::{FrameDecoder, ProtocolTag};

/// Degraded result for a frame a decoder claimed but could not decode:
/// unknown kind, but the claiming tag and (when cheaply available) the
/// device identity are kept for diagnostics.
fn degraded(frame: &RawFrame, tag: ProtocolTag, device_id: Option<String>) -> TrackerRecord {
    warn!(
        "claimed {:?} frame failed to decode: {}",
        tag,
        frame.text().trim_end()
    );
    let mut record = TrackerRecord::with_kind(frame, tag, RecordKind::Unknown);
    record.device_id = device_id;
    record
}

/// Map a decoded TZ report onto the normalized record shape.
/// TZ frames never carry MCC/MNC; the location stage fills those in from
/// the configured carrier context.
fn tz_record(frame: &RawFrame, tag: ProtocolTag, report: tzavl::TzReport) -> TrackerRecord {
    debug!("decoded {}", report);
    let mut record = TrackerRecord::with_kind(frame, tag, RecordKind::Data);
    record.device_id = Some(report.imei);
    record.datetime = Some(report.gprmc.datetime);
    record.cell_tower = Some(CellTower {
        mcc: None,
        mnc: None,
        lac: report.lac,
        cid: report.cid,
    });
    record.location = report
        .gprmc
        .position
        .map(|(lat, lon)| Position { lat, lon });
    record
}

/// TZ-AVL05 data frames
pub struct Avl05Decoder;

impl FrameDecoder for Avl05Decoder {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::TzAvl05
    }

    fn claims(&self, frame: &RawFrame) -> bool {
        tzavl::avl05::matches(frame.text())
    }

    fn decode(&self, frame: &RawFrame) -> TrackerRecord {
        match tzavl::avl05::parse(frame.text()) {
            Some(report) => tz_record(frame, self.tag(), report),
            None => degraded(frame, self.tag(), self.device_id(frame)),
        }
    }

    fn device_id(&self, frame: &RawFrame) -> Option<String> {
        tzavl::extract_imei(frame.text())
    }
}

/// TZ-AVL08 data frames
pub struct Avl08Decoder;

impl FrameDecoder for Avl08Decoder {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::TzAvl08
    }

    fn claims(&self, frame: &RawFrame) -> bool {
        tzavl::avl08::matches(frame.text())
    }

    fn decode(&self, frame: &RawFrame) -> TrackerRecord {
        match tzavl::avl08::parse(frame.text()) {
            Some(report) => tz_record(frame, self.tag(), report),
            None => degraded(frame, self.tag(), self.device_id(frame)),
        }
    }

    fn device_id(&self, frame: &RawFrame) -> Option<String> {
        tzavl::extract_imei(frame.text())
    }
}

/// TZ-AVL201 data frames
pub struct Avl201Decoder;

impl FrameDecoder for Avl201Decoder {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::TzAvl201
    }

    fn claims(&self, frame: &RawFrame) -> bool {
        tzavl::avl201::matches(frame.text())
    }

    fn decode(&self, frame: &RawFrame) -> TrackerRecord {
        match tzavl::avl201::parse(frame.text()) {
            Some(report) => tz_record(frame, self.tag(), report),
            None => degraded(frame, self.tag(), self.device_id(frame)),
        }
    }

    fn device_id(&self, frame: &RawFrame) -> Option<String> {
        tzavl::extract_imei(frame.text())
    }
}

/// TZ command acknowledgements: command traffic, never enriched
pub struct TzAckDecoder;

impl FrameDecoder for TzAckDecoder {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::TzAck
    }

    fn claims(&self, frame: &RawFrame) -> bool {
        tzavl::ack::matches(frame.text())
    }

    fn decode(&self, frame: &RawFrame) -> TrackerRecord {
        match tzavl::ack::parse(frame.text()) {
            Some(ack) => {
                debug!("decoded {}", ack);
                let mut record =
                    TrackerRecord::with_kind(frame, self.tag(), RecordKind::Command);
                record.device_id = Some(ack.imei);
                record
            }
            None => degraded(frame, self.tag(), None),
        }
    }

    fn device_id(&self, frame: &RawFrame) -> Option<String> {
        tzavl::ack::parse(frame.text()).map(|ack| ack.imei)
    }
}

/// Meitrack MVT380 frames: `AAA` position reports are data, everything
/// else is command traffic.
pub struct Mvt380Decoder;

impl FrameDecoder for Mvt380Decoder {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::MeitrackMvt380
    }

    fn claims(&self, frame: &RawFrame) -> bool {
        meitrack::mvt380::matches(frame.text())
    }

    fn decode(&self, frame: &RawFrame) -> TrackerRecord {
        match meitrack::mvt380::parse(frame.text()) {
            Some(meitrack::Mvt380Frame::Position(report)) => {
                debug!("decoded {}", report);
                let mut record =
                    TrackerRecord::with_kind(frame, self.tag(), RecordKind::Data);
                record.device_id = Some(report.imei);
                record.datetime = Some(report.datetime);
                record.cell_tower = Some(CellTower {
                    mcc: Some(report.base_station.mcc),
                    mnc: Some(report.base_station.mnc),
                    lac: report.base_station.lac,
                    cid: report.base_station.cid,
                });
                record.location = report.position.map(|(lat, lon)| Position { lat, lon });
                record
            }
            Some(meitrack::Mvt380Frame::Response(resp)) => {
                debug!("decoded MVT380 {} response to {}", resp.imei, resp.command);
                let mut record =
                    TrackerRecord::with_kind(frame, self.tag(), RecordKind::Command);
                record.device_id = Some(resp.imei);
                record
            }
            None => degraded(frame, self.tag(), self.device_id(frame)),
        }
    }

    fn device_id(&self, frame: &RawFrame) -> Option<String> {
        meitrack::extract_imei(frame.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const AVL05_SAMPLE: &[u8] = b"$$B6869444005480041|91$GPRMC,194329.000,A,3321.6735,S,07030.7640,W,0.00,0.00,090216,,,A*6C|02.1|01.3|01.7|000000000000|20160209194326|13981188|00000000|32D3A03F|0000|0.6376|0100|7B20\r\n";

    fn mvt380_sample() -> Vec<u8> {
        meitrack::checksum::frame(
            'A',
            "866771026198345,AAA,35,-33.361225,-70.512733,160209194329,A,10,21,60,192,0.8,551,26841,7283,730|1|32D3|A03F,0000",
        )
        .into_bytes()
    }

    #[test]
    fn test_avl05_decode_shape() {
        let frame = RawFrame::new(AVL05_SAMPLE);
        let record = Avl05Decoder.decode(&frame);
        assert_eq!(record.kind, RecordKind::Data);
        assert_eq!(record.protocol, ProtocolTag::TzAvl05);
        assert_eq!(record.device_id.as_deref(), Some("869444005480041"));
        assert_eq!(
            record.datetime.map(|dt| dt.to_rfc3339()),
            Some("2016-02-09T19:43:29+00:00".to_string())
        );
        let tower = record.cell_tower.expect("TZ frames carry the cell");
        assert_eq!(tower.mcc, None);
        assert_eq!(tower.lac, 0x32D3);
        assert_eq!(tower.cid, 0xA03F);
        let location = record.location.expect("valid fix");
        assert_abs_diff_eq!(location.lat, -33.361225, epsilon = 1e-6);
        assert_abs_diff_eq!(location.lon, -70.512733, epsilon = 1e-5);
        // The location stage owns this field, not the decoder
        assert!(record.location_source.is_none());
    }

    #[test]
    fn test_avl05_claimed_but_malformed_degrades() {
        let corrupt = String::from_utf8_lossy(AVL05_SAMPLE).replace("*6C", "*00");
        let frame = RawFrame::new(corrupt.as_bytes());
        assert!(Avl05Decoder.claims(&frame));
        let record = Avl05Decoder.decode(&frame);
        assert_eq!(record.kind, RecordKind::Unknown);
        assert_eq!(record.protocol, ProtocolTag::TzAvl05);
        // The identity is still recoverable from the header
        assert_eq!(record.device_id.as_deref(), Some("869444005480041"));
    }

    #[test]
    fn test_mvt380_position_decode_shape() {
        let bytes = mvt380_sample();
        let frame = RawFrame::new(&bytes);
        let record = Mvt380Decoder.decode(&frame);
        assert_eq!(record.kind, RecordKind::Data);
        assert_eq!(record.device_id.as_deref(), Some("866771026198345"));
        let tower = record.cell_tower.expect("base station block");
        assert_eq!(tower.mcc, Some(730));
        assert_eq!(tower.mnc, Some(1));
        assert!(record.location.is_some());
    }

    #[test]
    fn test_mvt380_response_is_command_kind() {
        let bytes = meitrack::checksum::frame('A', "866771026198345,A11,OK").into_bytes();
        let frame = RawFrame::new(&bytes);
        let record = Mvt380Decoder.decode(&frame);
        assert_eq!(record.kind, RecordKind::Command);
        assert_eq!(record.device_id.as_deref(), Some("866771026198345"));
        assert!(record.location.is_none());
        assert!(record.datetime.is_none());
    }

    #[test]
    fn test_ack_is_command_kind() {
        let frame = RawFrame::new(b"Receive:'002'|869444005480041|OK\r\n");
        let record = TzAckDecoder.decode(&frame);
        assert_eq!(record.kind, RecordKind::Command);
        assert_eq!(record.device_id.as_deref(), Some("869444005480041"));
    }
}
