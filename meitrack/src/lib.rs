//! Meitrack Protocol Library
//!
//! Decodes uplink frames from Meitrack GPS trackers (MVT380 wire format):
//! - Frame format predicate for protocol sniffing
//! - `AAA` position report decoding into [`Mvt380Report`]
//! - Non-`AAA` frames surfaced as command responses
//! - Additive frame checksum verification
//!
//! # Example
//!
//! ```no_run
//! use meitrack::{is_meitrack, mvt380};
//!
//! let text = "$$A120,866771026198345,AAA,35,...";
//! if is_meitrack(text) {
//!     if let Some(frame) = mvt380::parse(text) {
//!         println!("{}", frame);
//!     }
//! }
//! ```

pub mod checksum;
pub mod mvt380;

// Re-export commonly used types
pub use mvt380::{extract_imei, parse, BaseStation, Mvt380Frame, Mvt380Report, Mvt380Response};

/// True for any frame with the Meitrack `$$<flag><len>,<imei>,` shape
pub fn is_meitrack(text: &str) -> bool {
    mvt380::matches(text)
}
