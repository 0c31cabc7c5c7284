use crate::report::{self, TzReport, TzVariant};

/// TZ-AVL08 data frame: the AVL05 shape plus an 8-character RFID section
/// before the checksum (15 sections in total).
const SECTION_COUNT: usize = 15;
const CELL_HALF: usize = 4;
const RFID_LEN: usize = 8;

/// Cheap structural predicate used for protocol sniffing
pub fn matches(text: &str) -> bool {
    let parts = report::frame_parts(text);
    parts.len() == SECTION_COUNT
        && report::header_matches(&parts)
        && parts[9].len() == CELL_HALF * 2
        && parts[13].len() == RFID_LEN
}

/// Decode an AVL08 frame, or `None` when any section is malformed
pub fn parse(text: &str) -> Option<TzReport> {
    let parts = report::frame_parts(text);
    if !(parts.len() == SECTION_COUNT
        && report::header_matches(&parts)
        && parts[13].len() == RFID_LEN)
    {
        return None;
    }
    let mut decoded = report::parse_common(&parts, TzVariant::Avl08, CELL_HALF)?;
    decoded.rfid = Some(parts[13].to_string());
    decoded.checksum = parts[14].to_string();
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::variant_of;

    const SAMPLE: &str = "$$C8869444005480041|91$GPRMC,194329.000,A,3321.6735,S,07030.7640,W,0.00,0.00,090216,,,A*6C|02.1|01.3|01.7|000000000000|20160209194326|13981188|00000000|32D3A03F|0000|0.6376|0100|004A3F1B|7B20\r\n";

    #[test]
    fn test_matches_sample_and_not_avl05() {
        assert!(matches(SAMPLE));
        assert!(!crate::avl05::matches(SAMPLE));
        assert_eq!(variant_of(SAMPLE), Some(TzVariant::Avl08));
    }

    #[test]
    fn test_parse_carries_rfid() {
        let report = parse(SAMPLE).expect("sample should decode");
        assert_eq!(report.variant, TzVariant::Avl08);
        assert_eq!(report.rfid.as_deref(), Some("004A3F1B"));
        assert_eq!(report.checksum, "7B20");
        assert!(report.imsi.is_none());
    }

    #[test]
    fn test_matches_rejects_short_rfid() {
        let short = SAMPLE.replace("|004A3F1B|", "|04A3F1B|");
        assert!(!matches(&short));
    }
}
