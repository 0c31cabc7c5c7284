use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::checksum;

/// Serving base station block from an `AAA` report (`mcc|mnc|lac|cid`,
/// LAC and CID in hex)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStation {
    pub mcc: u16,
    pub mnc: u16,
    pub lac: u32,
    pub cid: u32,
}

/// Decoded MVT380 `AAA` position report
#[derive(Debug, Clone)]
pub struct Mvt380Report {
    /// 15-digit device identity
    pub imei: String,
    /// Event code that triggered the report (35 = track by interval)
    pub event: u16,
    /// (latitude, longitude) decimal degrees; only present for valid fixes
    pub position: Option<(f64, f64)>,
    /// Device-reported UTC timestamp (yymmddHHMMSS section)
    pub datetime: DateTime<Utc>,
    /// Fix validity flag ('A' = valid, 'V' = void)
    pub valid: bool,
    pub satellites: u8,
    pub gsm_signal: u8,
    pub speed_kmh: f64,
    pub heading_deg: f64,
    pub hdop: f64,
    pub altitude_m: f64,
    /// Total mileage in meters
    pub mileage_m: u64,
    /// Total runtime in seconds
    pub runtime_s: u64,
    pub base_station: BaseStation,
    /// Output/input port state section, kept verbatim
    pub state: String,
}

/// Non-`AAA` frame: the device answering a downlink command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mvt380Response {
    pub imei: String,
    /// Command name being answered (e.g. "A11")
    pub command: String,
}

/// Any decodable MVT380 frame
#[derive(Debug, Clone)]
pub enum Mvt380Frame {
    Position(Mvt380Report),
    Response(Mvt380Response),
}

impl fmt::Display for Mvt380Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MVT380 {} event {}: ", self.imei, self.event)?;
        match self.position {
            Some((lat, lon)) => write!(f, "fix {:.6}, {:.6}", lat, lon)?,
            None => write!(
                f,
                "no fix, cell {}/{}/{:X}/{:X}",
                self.base_station.mcc,
                self.base_station.mnc,
                self.base_station.lac,
                self.base_station.cid
            )?,
        }
        write!(
            f,
            " at {} ({:.0} km/h, {} sats)",
            self.datetime.format("%Y-%m-%d %H:%M:%S"),
            self.speed_kmh,
            self.satellites
        )
    }
}

impl fmt::Display for Mvt380Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mvt380Frame::Position(report) => write!(f, "{}", report),
            Mvt380Frame::Response(resp) => {
                write!(f, "MVT380 {} response to {}", resp.imei, resp.command)
            }
        }
    }
}

/// Cheap structural predicate used for protocol sniffing:
/// `$$<flag letter><decimal length>,<15-digit imei>,`
pub fn matches(text: &str) -> bool {
    let Some(rest) = text.strip_prefix("$$") else {
        return false;
    };
    let mut bytes = rest.bytes();
    if !bytes.next().is_some_and(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    let Some(comma) = rest.find(',') else {
        return false;
    };
    if comma < 2 || !rest[1..comma].bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let after = &rest[comma + 1..];
    after.len() > 16
        && after.as_bytes()[..15].iter().all(u8::is_ascii_digit)
        && after.as_bytes()[15] == b','
}

/// Pull the IMEI out of a frame header without decoding the rest
pub fn extract_imei(text: &str) -> Option<String> {
    if !matches(text) {
        return None;
    }
    let rest = text.strip_prefix("$$")?;
    let comma = rest.find(',')?;
    Some(rest[comma + 1..comma + 16].to_string())
}

/// Decode an MVT380 frame. `AAA` reports become [`Mvt380Frame::Position`],
/// anything else [`Mvt380Frame::Response`]. Returns `None` for frames whose
/// checksum or fields are malformed.
pub fn parse(text: &str) -> Option<Mvt380Frame> {
    if !matches(text) {
        return None;
    }
    if !checksum::verify(text) {
        tracing::debug!("MVT380 checksum mismatch: {}", text.trim_end());
        return None;
    }

    let trimmed = text.trim_end_matches(['\r', '\n']);
    let star = trimmed.rfind('*')?;
    let body = &trimmed[..star];
    let comma = body.find(',')?;
    let fields: Vec<&str> = body[comma + 1..].split(',').collect();
    if fields.len() < 2 {
        return None;
    }

    let imei = fields[0].to_string();
    let command = fields[1];
    if command != "AAA" {
        return Some(Mvt380Frame::Response(Mvt380Response {
            imei,
            command: command.to_string(),
        }));
    }

    // AAA layout: event, lat, lon, datetime, validity, sats, gsm, speed,
    // heading, hdop, altitude, mileage, runtime, base station, state, ...
    if fields.len() < 17 {
        return None;
    }
    let event: u16 = fields[2].parse().ok()?;
    let lat: f64 = fields[3].parse().ok()?;
    let lon: f64 = fields[4].parse().ok()?;
    let datetime = NaiveDateTime::parse_from_str(fields[5], "%y%m%d%H%M%S")
        .ok()?
        .and_utc();
    let valid = fields[6] == "A";
    let position = if valid { Some((lat, lon)) } else { None };

    let satellites: u8 = fields[7].parse().ok()?;
    let gsm_signal: u8 = fields[8].parse().ok()?;
    let speed_kmh: f64 = fields[9].parse().ok()?;
    let heading_deg: f64 = fields[10].parse().ok()?;
    let hdop: f64 = fields[11].parse().ok()?;
    let altitude_m: f64 = fields[12].parse().ok()?;
    let mileage_m: u64 = fields[13].parse().ok()?;
    let runtime_s: u64 = fields[14].parse().ok()?;
    let base_station = parse_base_station(fields[15])?;
    let state = fields[16].to_string();

    Some(Mvt380Frame::Position(Mvt380Report {
        imei,
        event,
        position,
        datetime,
        valid,
        satellites,
        gsm_signal,
        speed_kmh,
        heading_deg,
        hdop,
        altitude_m,
        mileage_m,
        runtime_s,
        base_station,
        state,
    }))
}

/// `mcc|mnc|lac|cid` with hex LAC/CID
fn parse_base_station(section: &str) -> Option<BaseStation> {
    let mut parts = section.split('|');
    let mcc: u16 = parts.next()?.parse().ok()?;
    let mnc: u16 = parts.next()?.parse().ok()?;
    let lac = u32::from_str_radix(parts.next()?, 16).ok()?;
    let cid = u32::from_str_radix(parts.next()?, 16).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(BaseStation { mcc, mnc, lac, cid })
}
