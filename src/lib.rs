//! GPS Tracker Telemetry Pipeline
//!
//! This library dispatches raw tracker frames to the protocol that produced
//! them and enriches the decoded records:
//! - Protocol sniffing over an ordered registry of decoders (TZ AVL05/08/201,
//!   TZ acknowledgements, Meitrack MVT380)
//! - Normalized records with device identity, timestamp, position and
//!   serving-cell identity
//! - Freshness annotation against an injectable clock
//! - Best-effort cell-tower triangulation for records without a GPS fix
//! - Reverse-geocoded addresses with a pluggable cache store
//! - Downlink command encoding for the TZ family
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tracking_parser::{extract_device_id, TrackerPipeline};
//! use tracking_parser::config::CarrierConfig;
//! use tracking_parser::address::StaticGeocoder;
//! use tracking_parser::location::StaticCellLocator;
//!
//! # async fn run(frame: &[u8]) {
//! let pipeline = TrackerPipeline::new(
//!     CarrierConfig::default(),
//!     Arc::new(StaticCellLocator::new()),
//!     Arc::new(StaticGeocoder::from_table(&Default::default(), true)),
//! );
//!
//! // Cheap identity peek, no external calls
//! let imei = extract_device_id(frame);
//!
//! // Full decode and enrichment
//! match pipeline.process(frame).await {
//!     Ok(record) => println!("{:?}: {:?}", imei, record.kind),
//!     Err(e) => eprintln!("address enrichment failed: {}", e),
//! }
//! # }
//! ```

pub mod address;
pub mod app_metrics;
pub mod commands;
pub mod config;
pub mod decoders;
pub mod freshness;
pub mod location;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod router_state;
pub mod web;

// Re-export commonly used types
pub use commands::encode_command;
pub use pipeline::{PipelineError, TrackerPipeline};
pub use record::{
    CellTower, Freshness, LocationSource, Position, RawFrame, RecordKind, TrackerRecord,
};
pub use registry::{extract_device_id, DecoderRegistry, DeviceFamily, FrameDecoder, ProtocolTag};

// Re-export the protocol crates' instruction type used by the command
// encoding entry point
pub use tzavl::TzInstruction;
