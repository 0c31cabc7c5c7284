use tracing::debug;
use tzavl::{TzInstruction, DEFAULT_PASSWORD};

use crate::record::TrackerRecord;
use crate::registry::DeviceFamily;

/// Build the downlink payload carrying an instruction to the device behind
/// a decoded record.
///
/// Only the TZ family has a downlink side here; for every other family the
/// answer is "no command" (`None`), never an error. The password defaults
/// to the family's factory password.
pub fn encode_command(
    record: &TrackerRecord,
    instruction: &TzInstruction,
    password: Option<&str>,
) -> Option<String> {
    match record.protocol.family() {
        Some(DeviceFamily::Tz) => {
            let payload =
                tzavl::encode_command(password.unwrap_or(DEFAULT_PASSWORD), instruction);
            debug!(
                "encoded {:?} for {:?}: {}",
                instruction, record.device_id, payload
            );
            Some(payload)
        }
        _ => None,
    }
}
