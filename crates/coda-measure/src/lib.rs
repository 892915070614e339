//! Batch measurement pipelines: envelope generation, coda end-time
//! autopicking, and path/site-corrected spectral measurement.
//!
//! Every pipeline is a data-parallel map over independent units (waveforms
//! or waveform x band pairings) with read-only shared parameters; per-unit
//! failures are logged and dropped so one bad waveform never aborts a batch.

pub mod autopick;
pub mod convert;
pub mod end_time;
pub mod envelope;
pub mod error;
pub mod peak_velocity;
pub mod spectra;

pub use autopick::Autopicker;
pub use end_time::{EndTimePicker, SnrEndTimePicker};
pub use envelope::EnvelopeGenerator;
pub use error::MeasureError;
pub use peak_velocity::measure_peak_velocities;
pub use spectra::measure_spectra;
