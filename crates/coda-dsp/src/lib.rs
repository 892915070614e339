//! Time-series primitive and numerical kernels for coda envelope processing.
//!
//! `TimeSeries` wraps a fixed-rate sample buffer with an absolute start time
//! (epoch seconds, UTC) and provides the cut / resample / detrend / filter /
//! envelope / smooth operations the measurement pipelines are built from.

pub mod butterworth;
pub mod error;
pub mod hilbert;
pub mod series;

pub use butterworth::Passband;
pub use error::DspError;
pub use series::TimeSeries;
