//! Waveform record <-> TimeSeries marshaling.
//!
//! The DSP layer works in epoch seconds; domain records carry chrono UTC
//! timestamps. All bridging between the two lives here.

use chrono::{DateTime, Utc};
use coda_dsp::TimeSeries;
use coda_model::Waveform;

/// Epoch seconds (fractional) of a UTC timestamp.
#[must_use]
pub fn epoch_secs(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1e6
}

/// UTC timestamp from fractional epoch seconds, at microsecond resolution.
#[must_use]
pub fn datetime_from_epoch(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros((secs * 1e6).round() as i64).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Lift a waveform's sample segment into a `TimeSeries` for processing.
#[must_use]
pub fn waveform_to_series(waveform: &Waveform) -> TimeSeries {
    TimeSeries::new(
        waveform.segment.clone(),
        waveform.sample_rate,
        epoch_secs(waveform.begin_time),
    )
}
