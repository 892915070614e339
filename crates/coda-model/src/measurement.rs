use serde::{Deserialize, Serialize};

use crate::band::FrequencyBand;
use crate::waveform::Waveform;

/// Peak envelope velocity measured on one band-filtered envelope waveform,
/// together with the noise floor it was measured against.
///
/// Amplitudes are in the waveform's log10 envelope units. The autopicker
/// mutates the carried waveform's pick list in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeakVelocityMeasurement {
    pub waveform: Waveform,
    /// Noise floor, log10 envelope amplitude.
    pub noise_level: f64,
    /// Source-to-station distance in km.
    pub distance_km: f64,
    /// Peak envelope amplitude after the expected arrival.
    pub velocity: f64,
    /// Peak minus noise floor, in log10 units.
    pub snr: f64,
    /// Time of the peak in seconds from the event origin.
    pub time_secs_from_origin: f64,
}

/// Path- and site-corrected spectral measurement of one coda envelope fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectraMeasurement {
    pub waveform_id: u64,
    pub band: FrequencyBand,
    /// Fitted log10 amplitude at the coda start pick.
    pub raw_at_start: f64,
    /// Fitted log10 amplitude at the coda end (measurement time).
    pub raw_at_measurement_time: f64,
    /// Raw amplitude with the distance-decay path term removed.
    pub path_corrected: f64,
    /// Path-corrected amplitude with the per-station site term removed.
    pub path_and_site_corrected: f64,
}
