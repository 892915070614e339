//! Coda end-time estimation.

/// Contract for proposing a coda end time on a velocity-measured envelope.
///
/// Implementations receive the full sample buffer (log10 envelope
/// amplitude), its rate, the coda start (epoch seconds and sample index),
/// the allowed coda length bounds, the SNR threshold, and the measured
/// noise floor. They return a proposed absolute end time in epoch seconds,
/// or `None` when no usable end exists.
pub trait EndTimePicker: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn estimate_end_time(
        &self,
        samples: &[f64],
        sample_rate: f64,
        start_epoch_secs: f64,
        start_index: usize,
        min_length_secs: f64,
        max_length_secs: f64,
        min_snr: f64,
        noise_level: f64,
    ) -> Option<f64>;
}

/// Default end-time heuristic: a forward-mean SNR threshold walk.
///
/// Working in log10 amplitude, the SNR threshold is
/// `noise_level + log10(min_snr)`. Starting at the coda start index the
/// picker slides a short forward window; the proposed end is the first time
/// the window mean drops below the threshold. A signal still above
/// threshold at the search bound (`max_length_secs` past the start)
/// proposes the bound itself; a signal already below threshold at the
/// start, or one dropping out before `min_length_secs`, has no usable end.
pub struct SnrEndTimePicker {
    window_samples: usize,
}

impl Default for SnrEndTimePicker {
    fn default() -> Self {
        Self { window_samples: 5 }
    }
}

impl SnrEndTimePicker {
    /// Picker with a custom forward-mean window, in samples.
    #[must_use]
    pub fn new(window_samples: usize) -> Self {
        Self {
            window_samples: window_samples.max(1),
        }
    }

    fn forward_mean(&self, samples: &[f64], index: usize) -> f64 {
        let hi = (index + self.window_samples).min(samples.len());
        let window = &samples[index..hi];
        window.iter().sum::<f64>() / window.len() as f64
    }
}

impl EndTimePicker for SnrEndTimePicker {
    #[allow(clippy::too_many_arguments)]
    fn estimate_end_time(
        &self,
        samples: &[f64],
        sample_rate: f64,
        start_epoch_secs: f64,
        start_index: usize,
        min_length_secs: f64,
        max_length_secs: f64,
        min_snr: f64,
        noise_level: f64,
    ) -> Option<f64> {
        if samples.is_empty() || start_index >= samples.len() || sample_rate <= 0.0 {
            return None;
        }
        let threshold = noise_level + min_snr.max(1.0).log10();
        if self.forward_mean(samples, start_index) < threshold {
            // Nothing above the noise floor to begin with.
            return None;
        }

        let search_end = start_index
            .saturating_add((max_length_secs * sample_rate).ceil() as usize)
            .min(samples.len() - 1);

        for index in (start_index + 1)..=search_end {
            if self.forward_mean(samples, index) < threshold {
                let offset_secs = (index - start_index) as f64 / sample_rate;
                if offset_secs < min_length_secs {
                    return None;
                }
                return Some(start_epoch_secs + offset_secs);
            }
        }

        // Still above threshold at the bound: propose the bound.
        Some(start_epoch_secs + (search_end - start_index) as f64 / sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Envelope at 3.0 until `drop_at` seconds after the start, then an
    /// immediate drop to the floor.
    fn step_signal(n: usize, start: usize, drop_at: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i < start + drop_at { 3.0 } else { -2.0 })
            .collect()
    }

    #[test]
    fn picks_the_threshold_crossing() {
        let picker = SnrEndTimePicker::default();
        let samples = step_signal(400, 30, 60);
        let end = picker.estimate_end_time(&samples, 1.0, 1030.0, 30, 5.0, 200.0, 3.0, 0.01);
        // The forward mean dips below threshold a few samples early.
        assert!(end.is_some());
        if let Some(end) = end {
            let offset = end - 1030.0;
            assert!(
                (offset - 60.0).abs() <= picker.window_samples as f64,
                "offset {offset}"
            );
        }
    }

    #[test]
    fn quiet_signal_has_no_end() {
        let picker = SnrEndTimePicker::default();
        let samples = vec![-2.0; 100];
        assert_eq!(
            picker.estimate_end_time(&samples, 1.0, 0.0, 10, 5.0, 200.0, 3.0, 0.01),
            None
        );
    }

    #[test]
    fn crossing_before_min_length_is_unusable() {
        let picker = SnrEndTimePicker::default();
        // Drops 2 s after the start; min length is 5 s.
        let samples = step_signal(100, 10, 2);
        assert_eq!(
            picker.estimate_end_time(&samples, 1.0, 10.0, 10, 5.0, 200.0, 3.0, 0.01),
            None
        );
    }

    #[test]
    fn sustained_signal_proposes_the_bound() {
        let picker = SnrEndTimePicker::default();
        let samples = vec![3.0; 500];
        let end = picker.estimate_end_time(&samples, 1.0, 0.0, 0, 5.0, 200.0, 3.0, 0.01);
        assert_eq!(end, Some(200.0));
    }
}
