use std::sync::Arc;

use crate::address::{AddressEnricher, GeocodeError, Geocoder};
use crate::config::CarrierConfig;
use crate::freshness::FreshnessEvaluator;
use crate::location::{CellLocator, LocationEnricher};
use crate::record::{RawFrame, RecordKind, TrackerRecord};
use crate::registry::DecoderRegistry;

/// Failure of a pipeline run.
///
/// Deliberately narrow: unrecognised input and triangulation failures are
/// not errors (they degrade the record instead), so the only way a run
/// fails is the address stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("address enrichment failed: {0}")]
    Address(#[from] GeocodeError),
}

/// The dispatch-and-enrichment pipeline:
/// sniff → decode → (data frames only) freshness → location → address.
///
/// Command and unknown frames return right after decode, untouched by the
/// enrichment stages. Stages run strictly in sequence: the address lookup
/// needs whatever position the location stage settled on. No retries and
/// no internal timeouts; callers wanting a deadline wrap the whole call.
pub struct TrackerPipeline {
    registry: DecoderRegistry,
    freshness: FreshnessEvaluator,
    location: LocationEnricher,
    address: AddressEnricher,
}

impl TrackerPipeline {
    /// Pipeline over the built-in protocol set
    pub fn new(
        carrier: CarrierConfig,
        locator: Arc<dyn CellLocator>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self::with_parts(
            DecoderRegistry::with_default_protocols(),
            FreshnessEvaluator::new(),
            LocationEnricher::new(locator, carrier),
            AddressEnricher::new(geocoder),
        )
    }

    /// Fully custom wiring: registry, clock-bearing evaluator and both
    /// enrichment stages supplied by the caller
    pub fn with_parts(
        registry: DecoderRegistry,
        freshness: FreshnessEvaluator,
        location: LocationEnricher,
        address: AddressEnricher,
    ) -> Self {
        Self {
            registry,
            freshness,
            location,
            address,
        }
    }

    /// Run one frame through the pipeline
    pub async fn process(&self, raw: &[u8]) -> Result<TrackerRecord, PipelineError> {
        let frame = RawFrame::new(raw);
        let mut record = self.registry.decode(&frame);
        if record.kind != RecordKind::Data {
            return Ok(record);
        }

        if let Some(datetime) = record.datetime {
            record.freshness = Some(self.freshness.evaluate(datetime));
        }
        self.location.enrich(&mut record).await;
        self.address.enrich(&mut record).await?;
        Ok(record)
    }

    /// Device identity via this pipeline's registry; no enrichment, no
    /// external calls. Matches [`crate::extract_device_id`] for the
    /// built-in protocol set.
    pub fn extract_device_id(&self, raw: &[u8]) -> Option<String> {
        self.registry.extract_device_id(&RawFrame::new(raw))
    }
}
