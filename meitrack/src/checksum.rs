/// Additive checksum over every byte up to and including the `*` marker,
/// truncated to one byte and rendered as two uppercase hex digits.
pub fn sum(body_with_star: &str) -> u8 {
    body_with_star
        .bytes()
        .fold(0u8, |acc, b| acc.wrapping_add(b))
}

/// Verify the trailing checksum of a full frame (line ending optional).
/// Returns false when the frame has no `*` marker or the digits mismatch.
pub fn verify(frame: &str) -> bool {
    let trimmed = frame.trim_end_matches(['\r', '\n']);
    let Some(star) = trimmed.rfind('*') else {
        return false;
    };
    let declared = &trimmed[star + 1..];
    if declared.len() != 2 {
        return false;
    }
    match u8::from_str_radix(declared, 16) {
        Ok(expected) => sum(&trimmed[..=star]) == expected,
        Err(_) => false,
    }
}

/// Build a complete frame from its payload sections: fills in the length
/// section and appends checksum and line ending. Used by downstream tests
/// and simulators; devices do this on their side of the wire.
pub fn frame(flag: char, payload: &str) -> String {
    // Length counts everything after the length section itself,
    // line ending included: ",<payload>*CS\r\n"
    let length = 1 + payload.len() + 5;
    let body = format!("$${}{},{}*", flag, length, payload);
    format!("{}{:02X}\r\n", body, sum(&body))
}
