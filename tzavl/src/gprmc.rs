use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Decoded GPRMC (recommended minimum navigation) sentence.
///
/// TZ data frames embed a complete `$GPRMC,..*CS` sentence; the device clock
/// and the fix position both come from here.
#[derive(Debug, Clone)]
pub struct Gprmc {
    /// UTC timestamp assembled from the sentence date and time fields
    pub datetime: DateTime<Utc>,
    /// Fix validity flag ('A' = valid, 'V' = void)
    pub valid: bool,
    /// (latitude, longitude) in decimal degrees; only present for valid fixes
    pub position: Option<(f64, f64)>,
    /// Speed over ground in knots
    pub speed_knots: f64,
    /// Course over ground in degrees, when reported
    pub course_deg: Option<f64>,
}

/// Parse a `$GPRMC` sentence including its checksum.
///
/// Returns `None` for anything that is not a well-formed RMC sentence with a
/// matching XOR checksum. A void fix ('V') still parses; it just carries no
/// position.
pub fn parse(sentence: &str) -> Option<Gprmc> {
    let body = sentence.strip_prefix('$')?;
    let (body, checksum_hex) = body.split_once('*')?;
    let expected = u8::from_str_radix(checksum_hex.trim(), 16).ok()?;
    if checksum(body) != expected {
        tracing::debug!("GPRMC checksum mismatch: {}", sentence);
        return None;
    }

    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 10 || fields[0] != "GPRMC" {
        return None;
    }

    let time = parse_time(fields[1])?;
    let date = parse_date(fields[9])?;
    let datetime = date.and_time(time).and_utc();

    let valid = fields[2] == "A";
    let position = if valid {
        let lat = parse_coordinate(fields[3], fields[4])?;
        let lon = parse_coordinate(fields[5], fields[6])?;
        Some((lat, lon))
    } else {
        None
    };

    let speed_knots = if fields[7].is_empty() {
        0.0
    } else {
        fields[7].parse().ok()?
    };
    let course_deg = if fields[8].is_empty() {
        None
    } else {
        Some(fields[8].parse().ok()?)
    };

    Some(Gprmc {
        datetime,
        valid,
        position,
        speed_knots,
        course_deg,
    })
}

/// XOR checksum over the sentence body (between '$' and '*')
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Convert an NMEA "ddmm.mmmm" / "dddmm.mmmm" coordinate to decimal degrees.
/// The hemisphere field supplies the sign (S and W are negative).
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    if !value.is_ascii() {
        return None;
    }
    let dot = value.find('.')?;
    if dot < 3 {
        return None;
    }
    // The two integer digits before the decimal point are whole minutes
    let degrees: f64 = value[..dot - 2].parse().ok()?;
    let minutes: f64 = value[dot - 2..].parse().ok()?;
    let magnitude = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(magnitude),
        "S" | "W" => Some(-magnitude),
        _ => None,
    }
}

/// "hhmmss.sss" to a NaiveTime
fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() < 6 {
        return None;
    }
    let hour: u32 = value.get(0..2)?.parse().ok()?;
    let minute: u32 = value.get(2..4)?.parse().ok()?;
    let second: u32 = value.get(4..6)?.parse().ok()?;
    let milli: u32 = match value.get(7..) {
        Some(frac) if !frac.is_empty() => {
            // Fractional seconds are at most millisecond resolution here
            let padded = format!("{:0<3}", &frac[..frac.len().min(3)]);
            padded.parse().ok()?
        }
        _ => 0,
    };
    NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
}

/// "ddmmyy" to a NaiveDate (2000-based years)
fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 6 {
        return None;
    }
    let day: u32 = value.get(0..2)?.parse().ok()?;
    let month: u32 = value.get(2..4)?.parse().ok()?;
    let year: i32 = value.get(4..6)?.parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const SAMPLE: &str =
        "$GPRMC,194329.000,A,3321.6735,S,07030.7640,W,0.00,0.00,090216,,,A*6C";

    #[test]
    fn test_parse_valid_sentence() {
        let rmc = parse(SAMPLE).expect("sentence should parse");
        assert!(rmc.valid);
        assert_eq!(rmc.datetime.to_rfc3339(), "2016-02-09T19:43:29+00:00");

        let (lat, lon) = rmc.position.expect("valid fix carries a position");
        assert!((lat - -33.361225).abs() < 1e-6);
        assert!((lon - -70.512733).abs() < 1e-5);
        assert_eq!(rmc.speed_knots, 0.0);
        assert_eq!(rmc.course_deg, Some(0.0));
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let tampered = SAMPLE.replace("*6C", "*6D");
        assert!(parse(&tampered).is_none());
    }

    #[test]
    fn test_parse_void_fix_has_no_position() {
        // Same sentence with validity V; checksum changes by one bit
        let body = "GPRMC,194329.000,V,3321.6735,S,07030.7640,W,0.00,0.00,090216,,,A";
        let sentence = format!("${}*{:02X}", body, checksum(body));
        let rmc = parse(&sentence).expect("void sentences still parse");
        assert!(!rmc.valid);
        assert!(rmc.position.is_none());
        assert_eq!(rmc.datetime.hour(), 19);
    }

    #[test]
    fn test_parse_rejects_non_rmc() {
        let body = "GPGGA,194329.000,3321.6735,S,07030.7640,W,1,10,1.3,550.0,M,,,,";
        let sentence = format!("${}*{:02X}", body, checksum(body));
        assert!(parse(&sentence).is_none());
    }

    #[test]
    fn test_coordinate_conversion_hemispheres() {
        assert!((parse_coordinate("3321.6735", "S").unwrap() - -33.361225).abs() < 1e-6);
        assert!((parse_coordinate("3321.6735", "N").unwrap() - 33.361225).abs() < 1e-6);
        assert!((parse_coordinate("07030.7640", "W").unwrap() - -70.5127333).abs() < 1e-6);
        assert!(parse_coordinate("3321.6735", "X").is_none());
    }
}
