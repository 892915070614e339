//! Shared domain types for the coda calibration workspace.
//!
//! This crate contains the waveform/event/station records, pick types,
//! frequency-band parameter tables, measurement records, and job
//! configuration shared by the envelope and measurement pipelines.

pub mod band;
pub mod config;
pub mod error;
pub mod geo;
pub mod measurement;
pub mod result;
pub mod waveform;

pub use band::{FrequencyBand, SharedFrequencyBandParameters};
pub use config::{EnvelopeBandConfiguration, EnvelopeJobConfiguration};
pub use error::ModelError;
pub use measurement::{PeakVelocityMeasurement, SpectraMeasurement};
pub use result::JobResult;
pub use waveform::{Event, PickType, Station, Waveform, WaveformPick};
