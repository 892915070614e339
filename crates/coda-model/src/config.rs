use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One frequency-band entry of an envelope job.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeBandConfiguration {
    pub low_frequency: f64,
    pub high_frequency: f64,
    /// Envelope smoothing window in seconds.
    pub smoothing_secs: f64,
}

/// Band list applied uniformly to every waveform of an envelope job.
///
/// Serializable as TOML:
///
/// ```toml
/// [[bands]]
/// low_frequency = 1.0
/// high_frequency = 1.5
/// smoothing_secs = 1.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeJobConfiguration {
    pub bands: Vec<EnvelopeBandConfiguration>,
}

impl Default for EnvelopeJobConfiguration {
    /// The reference octave-spaced band set used when no job override is
    /// given.
    fn default() -> Self {
        let corners = [
            (0.02, 0.03),
            (0.03, 0.05),
            (0.05, 0.1),
            (0.1, 0.2),
            (0.2, 0.3),
            (0.3, 0.5),
            (0.5, 0.7),
            (0.7, 1.0),
            (1.0, 1.5),
            (1.5, 2.0),
            (2.0, 3.0),
            (3.0, 4.0),
            (4.0, 6.0),
            (6.0, 8.0),
        ];
        Self {
            bands: corners
                .iter()
                .map(|&(low, high)| EnvelopeBandConfiguration {
                    low_frequency: low,
                    high_frequency: high,
                    smoothing_secs: 1.0,
                })
                .collect(),
        }
    }
}

impl EnvelopeJobConfiguration {
    /// Load a job configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or validated.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading job configuration {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing job configuration {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating job configuration {}", path.display()))?;
        Ok(config)
    }

    /// Check every band entry is well-formed.
    ///
    /// # Errors
    /// Returns the first [`ModelError`] found: empty band list, inverted
    /// corners, or non-positive smoothing.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.bands.is_empty() {
            return Err(ModelError::EmptyConfiguration);
        }
        for band in &self.bands {
            if band.low_frequency <= 0.0 || band.low_frequency >= band.high_frequency {
                return Err(ModelError::InvalidBand {
                    low: band.low_frequency,
                    high: band.high_frequency,
                });
            }
            if band.smoothing_secs <= 0.0 {
                return Err(ModelError::InvalidSmoothing(band.smoothing_secs));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_band_set_validates() {
        let config = EnvelopeJobConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bands.len(), 14);
    }

    #[test]
    fn validation_catches_bad_entries() {
        let mut config = EnvelopeJobConfiguration { bands: Vec::new() };
        assert!(matches!(
            config.validate(),
            Err(ModelError::EmptyConfiguration)
        ));

        config.bands.push(EnvelopeBandConfiguration {
            low_frequency: 2.0,
            high_frequency: 1.0,
            smoothing_secs: 1.0,
        });
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidBand { .. })
        ));

        config.bands[0] = EnvelopeBandConfiguration {
            low_frequency: 1.0,
            high_frequency: 2.0,
            smoothing_secs: 0.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidSmoothing(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let config = EnvelopeJobConfiguration::default();
        let text = toml::to_string(&config);
        assert!(text.is_ok(), "default config should serialize");
        if let Ok(text) = text {
            let parsed: Result<EnvelopeJobConfiguration, _> = toml::from_str(&text);
            assert_eq!(parsed.ok(), Some(config));
        }
    }
}
