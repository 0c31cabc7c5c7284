use crate::report::{self, TzReport, TzVariant};

/// TZ-AVL201 data frame: 15 sections like AVL08, but with a 6+6 hex cell
/// identity (wide UMTS cell ids) and a 15-digit IMSI in place of the RFID.
const SECTION_COUNT: usize = 15;
const CELL_HALF: usize = 6;
const IMSI_LEN: usize = 15;

/// Cheap structural predicate used for protocol sniffing
pub fn matches(text: &str) -> bool {
    let parts = report::frame_parts(text);
    parts.len() == SECTION_COUNT
        && report::header_matches(&parts)
        && parts[9].len() == CELL_HALF * 2
        && parts[13].len() == IMSI_LEN
        && parts[13].bytes().all(|b| b.is_ascii_digit())
}

/// Decode an AVL201 frame, or `None` when any section is malformed
pub fn parse(text: &str) -> Option<TzReport> {
    let parts = report::frame_parts(text);
    if !(parts.len() == SECTION_COUNT
        && report::header_matches(&parts)
        && parts[13].len() == IMSI_LEN)
    {
        return None;
    }
    let mut decoded = report::parse_common(&parts, TzVariant::Avl201, CELL_HALF)?;
    decoded.imsi = Some(parts[13].to_string());
    decoded.checksum = parts[14].to_string();
    Some(decoded)
}
