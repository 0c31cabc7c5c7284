use crate::report::{self, TzReport, TzVariant};

/// TZ-AVL05 data frame: 14 '|'-separated sections with a 4+4 hex cell
/// identity. This is the base shape of the family; AVL08 and AVL201 extend it.
const SECTION_COUNT: usize = 14;
const CELL_HALF: usize = 4;

/// Cheap structural predicate used for protocol sniffing.
/// No field values are decoded; malformed input simply fails the checks.
pub fn matches(text: &str) -> bool {
    let parts = report::frame_parts(text);
    parts.len() == SECTION_COUNT
        && report::header_matches(&parts)
        && parts[9].len() == CELL_HALF * 2
}

/// Decode an AVL05 frame, or `None` when any section is malformed
pub fn parse(text: &str) -> Option<TzReport> {
    let parts = report::frame_parts(text);
    if parts.len() != SECTION_COUNT || !report::header_matches(&parts) {
        return None;
    }
    let mut decoded = report::parse_common(&parts, TzVariant::Avl05, CELL_HALF)?;
    decoded.checksum = parts[13].to_string();
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "$$B6869444005480041|91$GPRMC,194329.000,A,3321.6735,S,07030.7640,W,0.00,0.00,090216,,,A*6C|02.1|01.3|01.7|000000000000|20160209194326|13981188|00000000|32D3A03F|0000|0.6376|0100|7B20\r\n";

    #[test]
    fn test_matches_sample() {
        assert!(matches(SAMPLE));
    }

    #[test]
    fn test_matches_rejects_wrong_section_count() {
        // Dropping the temperature section breaks the shape
        let truncated = SAMPLE.replace("|0000|0.6376", "|0.6376");
        assert!(!matches(&truncated));
    }

    #[test]
    fn test_matches_rejects_wide_cell_section() {
        let widened = SAMPLE.replace("|32D3A03F|", "|000032D300A03F|");
        assert!(!matches(&widened));
    }

    #[test]
    fn test_parse_sample_fields() {
        let report = parse(SAMPLE).expect("sample should decode");
        assert_eq!(report.variant, TzVariant::Avl05);
        assert_eq!(report.imei, "869444005480041");
        assert_eq!(report.status, "000000000000");
        assert_eq!(report.voltage, "13981188");
        assert!((report.pdop - 2.1).abs() < 1e-9);
        assert!((report.hdop - 1.3).abs() < 1e-9);
        assert!((report.vdop - 1.7).abs() < 1e-9);
        assert!((report.odometer_km - 0.6376).abs() < 1e-9);
        assert_eq!(report.serial, "0100");
        assert!(report.rfid.is_none());
        assert!(report.imsi.is_none());
    }

    #[test]
    fn test_parse_degrades_on_bad_gprmc() {
        // Structurally an AVL05 frame, but the embedded sentence is corrupt
        let corrupt = SAMPLE.replace("*6C", "*00");
        assert!(matches(&corrupt));
        assert!(parse(&corrupt).is_none());
    }
}
