//! TZ AVL Protocol Library
//!
//! This library decodes uplink frames from the TZ family of GPS trackers and
//! encodes downlink commands for them:
//! - Frame format predicates for the TZ-AVL05, TZ-AVL08 and TZ-AVL201 variants
//! - Field decoders producing a [`TzReport`] per data frame
//! - GPRMC sentence parsing with checksum verification
//! - Command acknowledgement frames (`Receive:'...'`)
//! - Downlink command encoding (`*password,code,..#`)
//!
//! # Example
//!
//! ```no_run
//! use tzavl::{variant_of, parse};
//!
//! let text = "$$B6869444005480041|91$GPRMC,...";
//! if let Some(variant) = variant_of(text) {
//!     if let Some(report) = parse(text) {
//!         println!("{} ({:?}): {}", report.imei, variant, report);
//!     }
//! }
//! ```

pub mod ack;
pub mod avl05;
pub mod avl08;
pub mod avl201;
pub mod command;
pub mod gprmc;
pub mod report;

// Re-export commonly used types
pub use ack::TzAck;
pub use command::{encode_command, TzInstruction, DEFAULT_PASSWORD};
pub use gprmc::Gprmc;
pub use report::{extract_imei, is_tz, parse, variant_of, TzReport, TzVariant};
