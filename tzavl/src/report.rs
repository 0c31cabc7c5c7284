use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::gprmc::{self, Gprmc};
use crate::{ack, avl05, avl08, avl201};

/// TZ AVL frame variants, in sniffing priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TzVariant {
    Avl05,
    Avl08,
    Avl201,
}

/// Decoded TZ AVL data frame
///
/// All three variants share the same leading sections; AVL08 appends an RFID
/// tag and AVL201 an IMSI plus a wider cell identity field.
#[derive(Debug, Clone)]
pub struct TzReport {
    pub variant: TzVariant,
    /// 15-digit device identity from the frame header
    pub imei: String,
    /// Two-digit event/alarm code following the header
    pub event: u8,
    /// Embedded navigation sentence (clock, fix, speed)
    pub gprmc: Gprmc,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    /// 12-character I/O and alarm status bitmap, kept verbatim
    pub status: String,
    /// Device RTC timestamp (yyyymmddHHMMSS section)
    pub rtc_datetime: Option<DateTime<Utc>>,
    /// Battery/backup voltage section, kept verbatim
    pub voltage: String,
    /// ADC readings section, kept verbatim
    pub adc: String,
    /// Location area code of the serving cell
    pub lac: u32,
    /// Cell identity of the serving cell
    pub cid: u32,
    pub temperature: String,
    pub odometer_km: f64,
    /// Frame sequence section, kept verbatim
    pub serial: String,
    /// AVL08 only
    pub rfid: Option<String>,
    /// AVL201 only
    pub imsi: Option<String>,
    /// Trailing frame checksum section, captured but not verified
    pub checksum: String,
}

impl fmt::Display for TzReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "TZ-{:?} {} event {:02}: ",
            self.variant, self.imei, self.event
        )?;
        match self.gprmc.position {
            Some((lat, lon)) => write!(f, "fix {:.6}, {:.6}", lat, lon)?,
            None => write!(f, "no fix, cell {:04X}/{:04X}", self.lac, self.cid)?,
        }
        write!(
            f,
            " at {} ({:.1} kn)",
            self.gprmc.datetime.format("%Y-%m-%d %H:%M:%S"),
            self.gprmc.speed_knots
        )
    }
}

/// Identify which TZ data variant (if any) produced a frame.
///
/// Variants are tested in a fixed priority order using cheap structural
/// checks only; no field values are decoded here.
pub fn variant_of(text: &str) -> Option<TzVariant> {
    if avl05::matches(text) {
        Some(TzVariant::Avl05)
    } else if avl08::matches(text) {
        Some(TzVariant::Avl08)
    } else if avl201::matches(text) {
        Some(TzVariant::Avl201)
    } else {
        None
    }
}

/// True for any frame of the TZ family, data or acknowledgement
pub fn is_tz(text: &str) -> bool {
    variant_of(text).is_some() || ack::matches(text)
}

/// Decode a TZ data frame into a [`TzReport`]
pub fn parse(text: &str) -> Option<TzReport> {
    match variant_of(text)? {
        TzVariant::Avl05 => avl05::parse(text),
        TzVariant::Avl08 => avl08::parse(text),
        TzVariant::Avl201 => avl201::parse(text),
    }
}

/// Pull the IMEI out of a TZ frame header without decoding the rest.
/// Works for every data variant; acknowledgement frames are handled in [`ack`].
pub fn extract_imei(text: &str) -> Option<String> {
    let parts = frame_parts(text);
    header_imei(parts.first()?).map(str::to_string)
}

/// Split a frame into its '|'-separated sections, dropping the line ending
pub(crate) fn frame_parts(text: &str) -> Vec<&str> {
    text.trim_end_matches(['\r', '\n']).split('|').collect()
}

/// Validate the `$$<len><imei>` header section and return the IMEI slice
pub(crate) fn header_imei(section: &str) -> Option<&str> {
    let rest = section.strip_prefix("$$")?;
    if rest.len() != 17 || !rest.is_ascii() {
        return None;
    }
    let (len_hex, imei) = rest.split_at(2);
    if !len_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if !imei.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(imei)
}

/// Structural check shared by all data variants: header plus a
/// `<2-digit event>$GPRMC,` second section.
pub(crate) fn header_matches(parts: &[&str]) -> bool {
    let Some(first) = parts.first() else {
        return false;
    };
    if header_imei(first).is_none() {
        return false;
    }
    let Some(second) = parts.get(1) else {
        return false;
    };
    second.len() > 8
        && second.as_bytes()[..2].iter().all(u8::is_ascii_digit)
        && second[2..].starts_with("$GPRMC,")
}

/// Split a hex cell-identity section into (LAC, CID) halves
pub(crate) fn parse_cell(section: &str, half: usize) -> Option<(u32, u32)> {
    if section.len() != half * 2 || !section.is_ascii() {
        return None;
    }
    let lac = u32::from_str_radix(&section[..half], 16).ok()?;
    let cid = u32::from_str_radix(&section[half..], 16).ok()?;
    Some((lac, cid))
}

/// Decode the sections every variant shares (everything up to the
/// variant-specific tail). The caller fills in rfid/imsi/checksum.
pub(crate) fn parse_common(
    parts: &[&str],
    variant: TzVariant,
    cell_half: usize,
) -> Option<TzReport> {
    let imei = header_imei(parts[0])?.to_string();
    let event: u8 = parts[1].get(..2)?.parse().ok()?;
    let gprmc = gprmc::parse(parts[1].get(2..)?)?;

    let pdop: f64 = parts[2].parse().ok()?;
    let hdop: f64 = parts[3].parse().ok()?;
    let vdop: f64 = parts[4].parse().ok()?;

    let status = parts[5];
    if status.len() != 12 {
        return None;
    }
    let rtc_datetime = NaiveDateTime::parse_from_str(parts[6], "%Y%m%d%H%M%S")
        .ok()
        .map(|dt| dt.and_utc());

    let (lac, cid) = parse_cell(parts[9], cell_half)?;
    let odometer_km: f64 = parts[11].parse().ok()?;

    Some(TzReport {
        variant,
        imei,
        event,
        gprmc,
        pdop,
        hdop,
        vdop,
        status: status.to_string(),
        rtc_datetime,
        voltage: parts[7].to_string(),
        adc: parts[8].to_string(),
        lac,
        cid,
        temperature: parts[10].to_string(),
        odometer_km,
        serial: parts[12].to_string(),
        rfid: None,
        imsi: None,
        checksum: String::new(),
    })
}
