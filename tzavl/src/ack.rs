use std::fmt;

/// Uplink command acknowledgement: `Receive:'<code>'|<imei>|<echo>`
///
/// Devices answer downlink commands with one of these instead of a data
/// frame. They carry no navigation payload at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TzAck {
    /// Three-digit command code being acknowledged
    pub code: String,
    pub imei: String,
    /// Device echo of the command result, kept verbatim
    pub echo: String,
}

impl fmt::Display for TzAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TZ ack {} from {}: {}", self.code, self.imei, self.echo)
    }
}

/// Cheap structural predicate used for protocol sniffing
pub fn matches(text: &str) -> bool {
    text.starts_with("Receive:'")
}

/// Decode an acknowledgement frame, or `None` when malformed
pub fn parse(text: &str) -> Option<TzAck> {
    let trimmed = text.trim_end_matches(['\r', '\n']);
    let mut parts = trimmed.split('|');

    let head = parts.next()?;
    let code = head.strip_prefix("Receive:'")?.strip_suffix('\'')?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let imei = parts.next()?;
    if imei.len() != 15 || !imei.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(TzAck {
        code: code.to_string(),
        imei: imei.to_string(),
        echo: parts.next().unwrap_or_default().to_string(),
    })
}
