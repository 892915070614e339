use crate::butterworth::{self, Passband};
use crate::error::DspError;
use crate::hilbert;

/// Floor applied to envelope samples before log10 so finite non-negative
/// input can never produce -inf.
const LOG_FLOOR: f64 = 1e-9;

/// A fixed-rate sampled signal with an absolute start time.
///
/// Start and end times are epoch seconds (UTC); the end time is the time of
/// the last sample, `start + (len - 1) / rate`. Most operations mutate the
/// series in place, matching the way the measurement pipelines thread one
/// series through a processing chain.
///
/// Operations that need samples (detrend, taper, envelope, peak search)
/// treat an empty series as a caller precondition violation: they are
/// documented no-ops guarded by `debug_assert!`, not errors.
#[derive(Clone, Debug)]
pub struct TimeSeries {
    data: Vec<f64>,
    sample_rate: f64,
    start_epoch_secs: f64,
}

impl TimeSeries {
    /// Wrap a sample buffer recorded at `sample_rate` starting at
    /// `start_epoch_secs`.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not strictly positive.
    #[must_use]
    pub fn new(data: Vec<f64>, sample_rate: f64, start_epoch_secs: f64) -> Self {
        assert!(sample_rate > 0.0, "sample rate must be positive");
        Self {
            data,
            sample_rate,
            start_epoch_secs,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Consume the series, returning the sample buffer.
    #[must_use]
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// Epoch seconds of the first sample.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_epoch_secs
    }

    /// Epoch seconds of the last sample.
    #[must_use]
    pub fn end_time(&self) -> f64 {
        if self.data.is_empty() {
            self.start_epoch_secs
        } else {
            self.start_epoch_secs + (self.data.len() - 1) as f64 / self.sample_rate
        }
    }

    /// Series duration in seconds, first sample to last.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.end_time() - self.start_epoch_secs
    }

    /// Index of the sample nearest epoch time `t`, clamped to bounds.
    #[must_use]
    pub fn index_for_time(&self, t: f64) -> usize {
        let idx = ((t - self.start_epoch_secs) * self.sample_rate).round();
        let max = self.data.len().saturating_sub(1);
        if idx <= 0.0 { 0 } else { (idx as usize).min(max) }
    }

    /// Epoch time of sample `index`.
    #[must_use]
    pub fn time_for_index(&self, index: usize) -> f64 {
        self.start_epoch_secs + index as f64 / self.sample_rate
    }

    /// Truncate in place to the window [start, end], clipping to available
    /// samples when the window partially overlaps the series.
    ///
    /// # Errors
    /// [`DspError::InvalidWindow`] when `start >= end`;
    /// [`DspError::CutOutOfBounds`] when the window lies entirely outside
    /// the series.
    pub fn cut(&mut self, start: f64, end: f64) -> Result<(), DspError> {
        if start >= end {
            return Err(DspError::InvalidWindow { start, end });
        }
        let out_of_bounds = || DspError::CutOutOfBounds {
            start,
            end,
            series_start: self.start_epoch_secs,
            series_end: self.end_time(),
        };
        if self.data.is_empty() || start > self.end_time() || end < self.start_epoch_secs {
            return Err(out_of_bounds());
        }

        // Half-sample tolerance so a window landing on a sample keeps it.
        let tol = 1e-6;
        let first = ((start - self.start_epoch_secs) * self.sample_rate - tol).ceil();
        let first = if first <= 0.0 { 0 } else { first as usize };
        let last = ((end - self.start_epoch_secs) * self.sample_rate + tol).floor();
        let last = if last < 0.0 {
            return Err(out_of_bounds());
        } else {
            (last as usize).min(self.data.len() - 1)
        };
        if first > last {
            return Err(out_of_bounds());
        }

        self.data.drain(last + 1..);
        self.data.drain(..first);
        self.start_epoch_secs += first as f64 / self.sample_rate;
        Ok(())
    }

    /// Drop all samples before epoch time `t`.
    ///
    /// # Errors
    /// [`DspError::CutOutOfBounds`] when `t` is past the end of the series.
    pub fn cut_before(&mut self, t: f64) -> Result<(), DspError> {
        if t <= self.start_epoch_secs {
            return Ok(());
        }
        if self.data.is_empty() || t > self.end_time() {
            return Err(DspError::CutOutOfBounds {
                start: t,
                end: self.end_time(),
                series_start: self.start_epoch_secs,
                series_end: self.end_time(),
            });
        }
        let first = ((t - self.start_epoch_secs) * self.sample_rate - 1e-6).ceil();
        let first = if first <= 0.0 { 0 } else { first as usize };
        self.data.drain(..first);
        self.start_epoch_secs += first as f64 / self.sample_rate;
        Ok(())
    }

    /// Drop all samples after epoch time `t`.
    ///
    /// # Errors
    /// [`DspError::CutOutOfBounds`] when `t` is before the start of the
    /// series.
    pub fn cut_after(&mut self, t: f64) -> Result<(), DspError> {
        if t >= self.end_time() {
            return Ok(());
        }
        if self.data.is_empty() || t < self.start_epoch_secs {
            return Err(DspError::CutOutOfBounds {
                start: self.start_epoch_secs,
                end: t,
                series_start: self.start_epoch_secs,
                series_end: self.end_time(),
            });
        }
        let last = ((t - self.start_epoch_secs) * self.sample_rate + 1e-6).floor() as usize;
        self.data.drain(last.min(self.data.len() - 1) + 1..);
        Ok(())
    }

    /// Linearly resample to a new uniform rate, preserving total duration to
    /// within one sample. Deterministic.
    ///
    /// # Errors
    /// [`DspError::InvalidSampleRate`] for non-positive rates.
    pub fn interpolate(&mut self, new_rate: f64) -> Result<(), DspError> {
        if new_rate <= 0.0 || !new_rate.is_finite() {
            return Err(DspError::InvalidSampleRate(new_rate));
        }
        if self.data.len() < 2 || (new_rate - self.sample_rate).abs() < f64::EPSILON {
            self.sample_rate = new_rate;
            return Ok(());
        }

        let duration = self.duration_secs();
        let new_len = (duration * new_rate).floor() as usize + 1;
        let ratio = self.sample_rate / new_rate;
        let old = &self.data;
        let last = old.len() - 1;

        let mut resampled = Vec::with_capacity(new_len);
        for i in 0..new_len {
            let pos = i as f64 * ratio;
            let i0 = (pos.floor() as usize).min(last - 1);
            let frac = pos - i0 as f64;
            resampled.push(old[i0] * (1.0 - frac) + old[i0 + 1] * frac.min(1.0));
        }

        self.data = resampled;
        self.sample_rate = new_rate;
        Ok(())
    }

    /// Subtract the mean.
    pub fn remove_mean(&mut self) {
        debug_assert!(!self.data.is_empty(), "remove_mean on empty series");
        if self.data.is_empty() {
            return;
        }
        let mean = self.data.iter().sum::<f64>() / self.data.len() as f64;
        for x in &mut self.data {
            *x -= mean;
        }
    }

    /// Subtract the least-squares line through the samples.
    pub fn remove_trend(&mut self) {
        debug_assert!(!self.data.is_empty(), "remove_trend on empty series");
        let n = self.data.len();
        if n < 2 {
            return;
        }

        let n_f = n as f64;
        let x_mean = (n_f - 1.0) / 2.0;
        let y_mean = self.data.iter().sum::<f64>() / n_f;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (i, &y) in self.data.iter().enumerate() {
            let dx = i as f64 - x_mean;
            sxy += dx * (y - y_mean);
            sxx += dx * dx;
        }
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = y_mean - slope * x_mean;
        for (i, y) in self.data.iter_mut().enumerate() {
            *y -= intercept + slope * i as f64;
        }
    }

    /// Cosine-taper `percent`% of the series length at each end.
    pub fn taper(&mut self, percent: f64) {
        debug_assert!(!self.data.is_empty(), "taper on empty series");
        let n = self.data.len();
        let width = ((percent / 100.0) * n as f64).round() as usize;
        let width = width.min(n / 2);
        if width == 0 {
            return;
        }
        for i in 0..width {
            let w = 0.5 * (1.0 - (std::f64::consts::PI * i as f64 / width as f64).cos());
            self.data[i] *= w;
            self.data[n - 1 - i] *= w;
        }
    }

    /// Butterworth-filter the series in place.
    ///
    /// Zero-phase mode runs the cascade forward and backward: non-causal,
    /// but no time shift is introduced.
    ///
    /// # Errors
    /// [`DspError::FilterDesign`] when the specification cannot be realized
    /// at this sample rate.
    pub fn filter(
        &mut self,
        order: usize,
        passband: Passband,
        low_hz: f64,
        high_hz: f64,
        zero_phase: bool,
    ) -> Result<(), DspError> {
        let sections = butterworth::design(order, passband, low_hz, high_hz, self.sample_rate)?;
        if zero_phase {
            butterworth::filter_zero_phase(&sections, &mut self.data);
        } else {
            butterworth::filter_in_place(&sections, &mut self.data);
        }
        Ok(())
    }

    /// Rectify to the instantaneous envelope (analytic-signal magnitude).
    pub fn envelope(&mut self) {
        debug_assert!(!self.data.is_empty(), "envelope on empty series");
        hilbert::envelope_in_place(&mut self.data);
    }

    /// Element-wise log10, flooring non-positive samples at a small epsilon.
    ///
    /// Envelopes are non-negative by construction; the floor only protects
    /// exact zeros from producing -inf.
    pub fn log10(&mut self) {
        for x in &mut self.data {
            *x = x.max(LOG_FLOOR).log10();
        }
    }

    /// Centered moving average of half-width `window_samples`, shrinking the
    /// window at the edges.
    pub fn smooth(&mut self, window_samples: usize) {
        if window_samples == 0 || self.data.is_empty() {
            return;
        }
        let n = self.data.len();
        let mut smoothed = Vec::with_capacity(n);
        for i in 0..n {
            let lo = i.saturating_sub(window_samples);
            let hi = (i + window_samples + 1).min(n);
            let sum: f64 = self.data[lo..hi].iter().sum();
            smoothed.push(sum / (hi - lo) as f64);
        }
        self.data = smoothed;
    }

    /// Offset (seconds from series start) and value of the peak sample.
    #[must_use]
    pub fn max_time(&self) -> (f64, f64) {
        debug_assert!(!self.data.is_empty(), "max_time on empty series");
        let mut peak_idx = 0;
        let mut peak = f64::NEG_INFINITY;
        for (i, &x) in self.data.iter().enumerate() {
            if x > peak {
                peak = x;
                peak_idx = i;
            }
        }
        (peak_idx as f64 / self.sample_rate, peak)
    }
}
