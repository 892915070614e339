use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A [low, high] Hz filter range defining one physical measurement channel.
///
/// Bands key the shared parameter tables, so `FrequencyBand` is hashable by
/// quantizing both corners to millihertz. Two bands closer than 1 mHz are the
/// same physical band; the calibration tables space bands far coarser than
/// that.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    /// Build a band, rejecting degenerate or non-positive corner pairs.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidBand`] when `low >= high` or `low <= 0`.
    pub fn new(low_hz: f64, high_hz: f64) -> Result<Self, ModelError> {
        if low_hz <= 0.0 || low_hz >= high_hz {
            return Err(ModelError::InvalidBand {
                low: low_hz,
                high: high_hz,
            });
        }
        Ok(Self { low_hz, high_hz })
    }

    /// Millihertz-quantized corners.
    fn quantized(self) -> (i64, i64) {
        (
            (self.low_hz * 1000.0).round() as i64,
            (self.high_hz * 1000.0).round() as i64,
        )
    }
}

impl PartialEq for FrequencyBand {
    fn eq(&self, other: &Self) -> bool {
        self.quantized() == other.quantized()
    }
}

impl Eq for FrequencyBand {}

impl std::hash::Hash for FrequencyBand {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.quantized().hash(state);
    }
}

/// Per-band physical constants shared by every waveform measured in that
/// band: the apparent-velocity model coefficients, SNR threshold, allowed
/// coda length bounds, and the envelope smoothing window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedFrequencyBandParameters {
    pub band: FrequencyBand,
    /// Apparent-velocity model: `vr = velocity0 - velocity1 / (velocity2 + distance)`.
    pub velocity0: f64,
    pub velocity1: f64,
    pub velocity2: f64,
    /// Minimum SNR (linear ratio) for a usable coda end.
    pub min_snr: f64,
    /// Minimum accepted coda length in seconds.
    pub min_length: f64,
    /// Maximum accepted coda length in seconds.
    pub max_length: f64,
    /// Envelope smoothing window in seconds.
    pub smoothing_secs: f64,
}

impl SharedFrequencyBandParameters {
    /// Apparent coda onset velocity for a source-to-station distance in km.
    ///
    /// A model that evaluates to exactly zero is substituted with 1.0 so the
    /// downstream distance/velocity division cannot collapse.
    #[must_use]
    pub fn apparent_velocity(&self, distance_km: f64) -> f64 {
        let vr = self.velocity0 - self.velocity1 / (self.velocity2 + distance_km);
        if vr == 0.0 { 1.0 } else { vr }
    }
}
