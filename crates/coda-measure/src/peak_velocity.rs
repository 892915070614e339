//! Peak envelope velocity and noise-floor measurement.
//!
//! Produces the `PeakVelocityMeasurement` records the autopicker and
//! spectral pipeline consume, one per envelope waveform with resolvable
//! reference data.

use std::collections::HashMap;

use coda_model::{geo, FrequencyBand, PeakVelocityMeasurement, SharedFrequencyBandParameters, Waveform};
use log::debug;
use rayon::prelude::*;

use crate::convert::{epoch_secs, waveform_to_series};

/// Noise window relative to the event origin, in seconds.
const NOISE_WINDOW_START_OFFSET: f64 = -140.0;
const NOISE_WINDOW_END_OFFSET: f64 = -10.0;

/// Fallback noise window length from the trace start, when the pre-origin
/// window is not covered.
const NOISE_FALLBACK_SECS: f64 = 20.0;

/// Measure peak envelope velocity, noise floor, and SNR for every waveform
/// with an event and shared band parameters. Units missing either are
/// skipped (not yet calibratable).
#[must_use]
pub fn measure_peak_velocities(
    waveforms: &[Waveform],
    band_parameters: &HashMap<FrequencyBand, SharedFrequencyBandParameters>,
) -> Vec<PeakVelocityMeasurement> {
    waveforms
        .par_iter()
        .filter_map(|wave| measure_one(wave, band_parameters))
        .collect()
}

fn measure_one(
    wave: &Waveform,
    band_parameters: &HashMap<FrequencyBand, SharedFrequencyBandParameters>,
) -> Option<PeakVelocityMeasurement> {
    let event = wave.event.as_ref()?;
    let band = FrequencyBand {
        low_hz: wave.low_frequency,
        high_hz: wave.high_frequency,
    };
    let params = band_parameters.get(&band)?;

    let distance_km = geo::distance_km(event, &wave.station);
    let origin = epoch_secs(event.origin_time);
    let series = waveform_to_series(wave);
    if series.length() == 0 {
        return None;
    }

    // Noise floor: median envelope amplitude before the first arrivals.
    let noise_level = {
        let mut noise = series.clone();
        let window = noise.cut(
            origin + NOISE_WINDOW_START_OFFSET,
            origin + NOISE_WINDOW_END_OFFSET,
        );
        if window.is_err() {
            noise = series.clone();
            // Trace starts at or after the origin: use its leading samples.
            let _ = noise.cut_after(noise.start_time() + NOISE_FALLBACK_SECS);
        }
        median(noise.data())
    };

    // Peak after the expected coda onset.
    let arrival = origin + distance_km / params.apparent_velocity(distance_km);
    let mut signal = series;
    if signal.cut_before(arrival).is_err() || signal.length() == 0 {
        debug!(
            "waveform {}: expected arrival past the trace end; skipping",
            wave.id
        );
        return None;
    }
    let (peak_offset, peak) = signal.max_time();

    Some(PeakVelocityMeasurement {
        waveform: wave.clone(),
        noise_level,
        distance_km,
        velocity: peak,
        snr: peak - noise_level,
        time_secs_from_origin: signal.start_time() + peak_offset - origin,
    })
}

/// Median of a sample slice; 0.0 for an empty slice.
fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
