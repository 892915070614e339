//! Automatic coda end-time picking on velocity-measured waveforms.

use std::collections::HashMap;

use coda_model::{
    FrequencyBand, PeakVelocityMeasurement, PickType, SharedFrequencyBandParameters, WaveformPick,
};
use log::trace;
use rayon::prelude::*;

use crate::convert::{epoch_secs, waveform_to_series};
use crate::end_time::{EndTimePicker, SnrEndTimePicker};

/// Legacy sentinel for a failed end pick.
const BAD: f64 = 0.0;

/// Peak search window after the expected coda onset, in seconds.
const PEAK_SEARCH_SECS: f64 = 30.0;

/// Sample rate the trace is resampled to for end-time estimation.
const PICKING_RATE_HZ: f64 = 1.0;

/// Attaches automatic coda end ("F") and start ("AP") picks to
/// velocity-measured waveforms.
///
/// A waveform is (re)picked only while no authoritative end pick exists: a
/// manual "F" with no "AP" marker is left alone, and a missing shared
/// parameter entry for the waveform's band skips the unit entirely.
pub struct Autopicker<P: EndTimePicker = SnrEndTimePicker> {
    end_picker: P,
}

impl Default for Autopicker<SnrEndTimePicker> {
    fn default() -> Self {
        Self::new(SnrEndTimePicker::default())
    }
}

impl<P: EndTimePicker> Autopicker<P> {
    /// An autopicker using the given end-time estimator.
    #[must_use]
    pub fn new(end_picker: P) -> Self {
        Self { end_picker }
    }

    /// Autopick every measurement in the batch, in parallel, returning the
    /// same measurements with their waveforms' pick lists updated in place.
    ///
    /// Map-like: units are independent, no unit's failure affects another,
    /// and skipped units come back unchanged.
    #[must_use]
    pub fn autopick_velocity_measured_waveforms(
        &self,
        measurements: Vec<PeakVelocityMeasurement>,
        band_parameters: &HashMap<FrequencyBand, SharedFrequencyBandParameters>,
    ) -> Vec<PeakVelocityMeasurement> {
        measurements
            .into_par_iter()
            .map(|mut vel| {
                self.autopick_one(&mut vel, band_parameters);
                vel
            })
            .collect()
    }

    fn autopick_one(
        &self,
        vel: &mut PeakVelocityMeasurement,
        band_parameters: &HashMap<FrequencyBand, SharedFrequencyBandParameters>,
    ) {
        let band = FrequencyBand {
            low_hz: vel.waveform.low_frequency,
            high_hz: vel.waveform.high_frequency,
        };
        let Some(params) = band_parameters.get(&band) else {
            return;
        };

        let has_end_pick = vel.waveform.pick_of_type(PickType::F).is_some();
        let has_auto_pick = vel.waveform.pick_of_type(PickType::Ap).is_some();
        // An end pick without the auto marker is authoritative (manual).
        if has_end_pick && !has_auto_pick {
            return;
        }
        let Some(event) = vel.waveform.event.clone() else {
            return;
        };

        trace!("starting autopick on waveform {}", vel.waveform.id);
        vel.waveform.associated_picks.clear();

        let vr = params.apparent_velocity(vel.distance_km);
        let origin = epoch_secs(event.origin_time);
        let trim_time = origin + vel.distance_km / vr;

        // Coda start: the envelope peak within 30 s of the expected onset,
        // falling back to the onset itself when the window cannot be cut.
        let start_epoch = {
            let mut trimmed = waveform_to_series(&vel.waveform);
            let window = trimmed
                .cut_before(trim_time)
                .and_then(|()| trimmed.cut_after(trim_time + PEAK_SEARCH_SECS));
            match window {
                Ok(()) if trimmed.length() > 0 => trim_time + trimmed.max_time().0,
                _ => trim_time,
            }
        };
        let start_sec_from_origin = start_epoch - origin;

        let mut segment = waveform_to_series(&vel.waveform);
        let end_value = if segment.interpolate(PICKING_RATE_HZ).is_ok() {
            let proposed = self.end_picker.estimate_end_time(
                segment.data(),
                segment.sample_rate(),
                start_epoch,
                segment.index_for_time(start_epoch),
                params.min_length,
                params.max_length,
                params.min_snr,
                vel.noise_level,
            );
            trace!("proposed end pick time {proposed:?}");

            match proposed {
                Some(end_epoch) => {
                    // Coda length relative to the start pick, clamped to the
                    // allowed bounds; too short means no usable pick.
                    let offset = end_epoch - start_epoch;
                    if offset < params.min_length {
                        BAD
                    } else {
                        offset.min(params.max_length)
                    }
                }
                None => BAD,
            }
        } else {
            BAD
        };

        let waveform_id = vel.waveform.id;
        vel.waveform
            .associated_picks
            .push(WaveformPick::new(PickType::F, waveform_id, end_value));
        vel.waveform.associated_picks.push(WaveformPick::new(
            PickType::Ap,
            waveform_id,
            start_sec_from_origin,
        ));
        trace!(
            "ending autopick on waveform {waveform_id}: F {end_value}, AP {start_sec_from_origin}"
        );
    }
}
