use std::fmt;

/// Factory password the trackers ship with
pub const DEFAULT_PASSWORD: &str = "000000";

/// Downlink instructions the TZ family understands.
///
/// Each variant maps to a numeric command code in the `*password,code,..#`
/// wire format the devices accept over SMS or GPRS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TzInstruction {
    /// One-shot position request
    QueryPosition,
    /// Change the device password
    SetUserPassword { new_password: String },
    /// Periodic reporting: every `seconds`, `times` repetitions (0 = forever)
    PositionInterval { seconds: u32, times: u32 },
    /// Cut the oil/engine relay output
    CutOilEngine,
    /// Restore the oil/engine relay output
    RestoreOilEngine,
    /// Reboot the GPS module
    Reboot,
}

impl TzInstruction {
    /// Numeric command code plus formatted arguments, without framing
    fn body(&self) -> String {
        match self {
            TzInstruction::QueryPosition => "000".to_string(),
            TzInstruction::SetUserPassword { new_password } => {
                format!("001,{}", new_password)
            }
            TzInstruction::PositionInterval { seconds, times } => {
                format!("002,{:04},{:04}", seconds, times)
            }
            TzInstruction::CutOilEngine => "025".to_string(),
            TzInstruction::RestoreOilEngine => "026".to_string(),
            TzInstruction::Reboot => "991".to_string(),
        }
    }
}

impl fmt::Display for TzInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.body())
    }
}

/// Encode a downlink command payload for a TZ device
pub fn encode_command(password: &str, instruction: &TzInstruction) -> String {
    format!("*{},{}#", password, instruction.body())
}
