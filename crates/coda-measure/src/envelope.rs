//! Per-band smoothed log10 envelope generation.

use coda_dsp::{DspError, Passband, TimeSeries};
use coda_model::{EnvelopeBandConfiguration, EnvelopeJobConfiguration, JobResult, Waveform};
use log::{debug, info};
use rayon::prelude::*;

use crate::convert::{datetime_from_epoch, epoch_secs, waveform_to_series};
use crate::error::MeasureError;

/// Cut window relative to the event origin time, in seconds.
const CUT_START_OFFSET_SECS: f64 = -150.0;
const CUT_END_OFFSET_SECS: f64 = 1500.0;

/// Fixed working sample rate for envelope processing.
const WORKING_RATE_HZ: f64 = 4.0;

/// Band-pass filter order.
const FILTER_ORDER: usize = 4;

/// Single-sided taper width, percent of trace length per end.
const TAPER_PERCENT: f64 = 1.0;

/// Produces one smoothed log10-envelope waveform per (waveform, band)
/// pairing of a job.
///
/// Pairings are independent and processed in parallel; a pairing that
/// cannot be computed (missing event, degenerate window, filter failure) is
/// logged and dropped, and the batch returns whatever it produced. Only
/// batch-level configuration problems fail the whole call.
#[derive(Default)]
pub struct EnvelopeGenerator {
    default_config: Option<EnvelopeJobConfiguration>,
}

impl EnvelopeGenerator {
    /// A generator with no default configuration: every job must carry its
    /// own band list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator that falls back to `config` when a job carries none.
    #[must_use]
    pub fn with_default_config(config: EnvelopeJobConfiguration) -> Self {
        Self {
            default_config: Some(config),
        }
    }

    /// Compute envelopes for every (waveform, band) pairing of the job.
    ///
    /// Returns a failed `JobResult` for an empty input collection or a
    /// missing configuration; otherwise a successful one carrying the
    /// envelopes that could be produced (possibly fewer than
    /// `waveforms.len() * bands.len()`).
    #[must_use]
    pub fn create_envelopes(
        &self,
        session_id: u64,
        waveforms: &[Waveform],
        job_config: Option<&EnvelopeJobConfiguration>,
    ) -> JobResult<Vec<Waveform>> {
        if waveforms.is_empty() {
            return JobResult::failure(MeasureError::NoWaveforms.to_string(), Vec::new());
        }
        let Some(config) = job_config.or_else(|| self.default_config.as_ref()) else {
            return JobResult::failure(MeasureError::NoConfiguration.to_string(), Vec::new());
        };

        let pairings: Vec<(&Waveform, &EnvelopeBandConfiguration)> = waveforms
            .iter()
            .flat_map(|wave| config.bands.iter().map(move |band| (wave, band)))
            .collect();

        let envelopes: Vec<Waveform> = pairings
            .par_iter()
            .filter_map(|&(wave, band)| Self::envelope_for_band(session_id, wave, band))
            .collect();

        debug!(
            "session {session_id}: produced {} envelopes from {} pairings",
            envelopes.len(),
            pairings.len()
        );
        JobResult::success(envelopes)
    }

    /// One (waveform, band) pairing. `None` drops the pairing.
    fn envelope_for_band(
        session_id: u64,
        wave: &Waveform,
        band: &EnvelopeBandConfiguration,
    ) -> Option<Waveform> {
        let Some(event) = wave.event.as_ref() else {
            info!(
                "session {session_id}: waveform {} has no event; skipping",
                wave.id
            );
            return None;
        };
        let origin = epoch_secs(event.origin_time);
        let start_cut = origin + CUT_START_OFFSET_SECS;
        let end_cut = origin + CUT_END_OFFSET_SECS;

        match Self::process(wave, band, start_cut, end_cut) {
            Ok(envelope) => envelope,
            Err(e) => {
                info!(
                    "session {session_id}: dropping waveform {} band [{}, {}]: {e}",
                    wave.id, band.low_frequency, band.high_frequency
                );
                None
            }
        }
    }

    /// The envelope chain proper. `Ok(None)` is a quiet skip (window does
    /// not apply); `Err` is a numerical failure the caller logs.
    fn process(
        wave: &Waveform,
        band: &EnvelopeBandConfiguration,
        start_cut: f64,
        end_cut: f64,
    ) -> Result<Option<Waveform>, DspError> {
        let mut seis: TimeSeries = waveform_to_series(wave);
        seis.interpolate(WORKING_RATE_HZ)?;

        if start_cut >= end_cut {
            info!("start time of cut is >= end time of cut");
            return Ok(None);
        }
        if start_cut >= seis.end_time() {
            info!("start time of cut is >= end time of seismogram");
            return Ok(None);
        }
        if end_cut <= seis.start_time() {
            info!("end time of cut is <= start time of seismogram");
            return Ok(None);
        }

        // Cut first, then detrend: detrending the full record would leave a
        // residual ramp over the window kept.
        seis.cut(start_cut, end_cut)?;
        seis.remove_mean();
        seis.remove_trend();
        seis.taper(TAPER_PERCENT);

        seis.filter(
            FILTER_ORDER,
            Passband::BandPass,
            band.low_frequency,
            band.high_frequency,
            true,
        )?;

        seis.envelope();
        seis.log10();

        let smoothing_samples = (band.smoothing_secs * seis.sample_rate()).round() as usize;
        seis.smooth(smoothing_samples);

        // Trim the smoothing edge artifacts off both ends.
        let trim_secs = 2.0 * smoothing_samples as f64 / seis.sample_rate();
        let trimmed_start = seis.start_time() + trim_secs;
        let trimmed_end = seis.end_time() - trim_secs;
        if trimmed_start >= trimmed_end {
            return Ok(None);
        }
        seis.cut(trimmed_start, trimmed_end)?;

        let mut envelope = wave.derived_shell();
        envelope.sample_rate = seis.sample_rate();
        envelope.low_frequency = band.low_frequency;
        envelope.high_frequency = band.high_frequency;
        envelope.begin_time = datetime_from_epoch(seis.start_time());
        envelope.end_time = datetime_from_epoch(seis.end_time());
        envelope.segment = seis.into_data();
        Ok(Some(envelope))
    }
}
