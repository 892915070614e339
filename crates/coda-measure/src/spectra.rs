//! Path- and site-corrected spectral measurement of coda envelope fits.

use std::collections::HashMap;

use coda_model::{
    FrequencyBand, PeakVelocityMeasurement, PickType, SharedFrequencyBandParameters,
    SpectraMeasurement,
};
use log::debug;
use rayon::prelude::*;

use crate::convert::{epoch_secs, waveform_to_series};

/// Minimum sample count for a usable coda decay fit.
const MIN_FIT_SAMPLES: usize = 3;

/// Measure path- and site-corrected spectral amplitudes for every
/// velocity-measured waveform carrying usable coda picks.
///
/// Per unit (parallel): least-squares line fit of the log10 envelope
/// between the "AP" start pick and the "F" end pick, giving the raw
/// amplitude at the coda start and at measurement time; the path-corrected
/// amplitude removes a geometrical-spreading term. A second, batch-wide
/// pass removes the per-station mean residual within each band as the site
/// term. Units without picks, with the failed-pick sentinel, or without
/// shared parameters are skipped.
#[must_use]
pub fn measure_spectra(
    measurements: &[PeakVelocityMeasurement],
    band_parameters: &HashMap<FrequencyBand, SharedFrequencyBandParameters>,
) -> Vec<SpectraMeasurement> {
    let mut fitted: Vec<(String, SpectraMeasurement)> = measurements
        .par_iter()
        .filter_map(|m| fit_one(m, band_parameters))
        .collect();

    apply_site_terms(&mut fitted);
    fitted.into_iter().map(|(_, m)| m).collect()
}

fn fit_one(
    measurement: &PeakVelocityMeasurement,
    band_parameters: &HashMap<FrequencyBand, SharedFrequencyBandParameters>,
) -> Option<(String, SpectraMeasurement)> {
    let wave = &measurement.waveform;
    let event = wave.event.as_ref()?;
    let band = FrequencyBand {
        low_hz: wave.low_frequency,
        high_hz: wave.high_frequency,
    };
    band_parameters.get(&band)?;

    let start_pick = wave.pick_of_type(PickType::Ap)?;
    let end_pick = wave.pick_of_type(PickType::F)?;
    let coda_length = end_pick.pick_time_sec_from_origin;
    if coda_length <= 0.0 {
        // Failed-pick sentinel.
        return None;
    }

    let origin = epoch_secs(event.origin_time);
    let fit_start = origin + start_pick.pick_time_sec_from_origin;
    let fit_end = fit_start + coda_length;

    let mut coda = waveform_to_series(wave);
    if coda.cut(fit_start, fit_end).is_err() || coda.length() < MIN_FIT_SAMPLES {
        debug!("waveform {}: unusable coda fit window; skipping", wave.id);
        return None;
    }

    let (intercept, slope) = line_fit(coda.data(), coda.sample_rate());
    let raw_at_start = intercept;
    let raw_at_measurement_time = intercept + slope * coda.duration_secs();

    // Geometrical spreading proxy; the fitted path model proper lives in
    // the calibration solver downstream.
    let path_term = measurement.distance_km.max(1.0).log10();
    let path_corrected = raw_at_measurement_time + path_term;

    Some((
        wave.station.name.clone(),
        SpectraMeasurement {
            waveform_id: wave.id,
            band,
            raw_at_start,
            raw_at_measurement_time,
            path_corrected,
            // Filled by the site pass.
            path_and_site_corrected: path_corrected,
        },
    ))
}

/// Least-squares `y = intercept + slope * t` over samples at `rate`, with
/// `t` in seconds from the first sample.
fn line_fit(data: &[f64], rate: f64) -> (f64, f64) {
    let n = data.len() as f64;
    let t_mean = (data.len() - 1) as f64 / (2.0 * rate);
    let y_mean = data.iter().sum::<f64>() / n;
    let mut sty = 0.0;
    let mut stt = 0.0;
    for (i, &y) in data.iter().enumerate() {
        let dt = i as f64 / rate - t_mean;
        sty += dt * (y - y_mean);
        stt += dt * dt;
    }
    let slope = if stt > 0.0 { sty / stt } else { 0.0 };
    (y_mean - slope * t_mean, slope)
}

/// Subtract the per-(station, band) mean residual against the band mean.
fn apply_site_terms(fitted: &mut [(String, SpectraMeasurement)]) {
    let mut band_sums: HashMap<FrequencyBand, (f64, f64)> = HashMap::new();
    let mut station_sums: HashMap<(String, FrequencyBand), (f64, f64)> = HashMap::new();
    for (station, m) in fitted.iter() {
        let band_entry = band_sums.entry(m.band).or_insert((0.0, 0.0));
        band_entry.0 += m.path_corrected;
        band_entry.1 += 1.0;
        let station_entry = station_sums
            .entry((station.clone(), m.band))
            .or_insert((0.0, 0.0));
        station_entry.0 += m.path_corrected;
        station_entry.1 += 1.0;
    }

    for (station, m) in fitted.iter_mut() {
        let band_mean = band_sums
            .get(&m.band)
            .map_or(0.0, |(sum, count)| sum / count);
        let station_mean = station_sums
            .get(&(station.clone(), m.band))
            .map_or(0.0, |(sum, count)| sum / count);
        let site_term = station_mean - band_mean;
        m.path_and_site_corrected = m.path_corrected - site_term;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use coda_model::{Event, Station, Waveform, WaveformPick};

    const ORIGIN_EPOCH: i64 = 1_600_000_000;

    fn dt(epoch: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(epoch, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn params_map() -> HashMap<FrequencyBand, SharedFrequencyBandParameters> {
        let band = FrequencyBand {
            low_hz: 1.0,
            high_hz: 2.0,
        };
        let mut map = HashMap::new();
        map.insert(
            band,
            SharedFrequencyBandParameters {
                band,
                velocity0: 3.5,
                velocity1: 10.0,
                velocity2: 0.0,
                min_snr: 3.0,
                min_length: 5.0,
                max_length: 200.0,
                smoothing_secs: 1.0,
            },
        );
        map
    }

    /// Measurement whose envelope decays linearly from `start_amp` at the
    /// AP pick with the given slope per second.
    fn measurement(
        id: u64,
        station: &str,
        start_amp: f64,
        slope: f64,
        bias: f64,
    ) -> PeakVelocityMeasurement {
        let rate = 1.0;
        let ap = 30.0;
        let coda = 60.0;
        let segment: Vec<f64> = (0..200)
            .map(|i| {
                let t = i as f64 / rate;
                bias + start_amp + slope * (t - ap)
            })
            .collect();
        let waveform = Waveform {
            id,
            sample_rate: rate,
            begin_time: dt(ORIGIN_EPOCH),
            end_time: dt(ORIGIN_EPOCH + 199),
            segment,
            event: Some(Event {
                event_id: "ev1".to_owned(),
                origin_time: dt(ORIGIN_EPOCH),
                latitude: 35.0,
                longitude: -105.0,
                depth_km: 5.0,
            }),
            station: Station {
                name: station.to_owned(),
                network: "IU".to_owned(),
                latitude: 36.0,
                longitude: -105.0,
            },
            low_frequency: 1.0,
            high_frequency: 2.0,
            associated_picks: vec![
                WaveformPick::new(PickType::F, id, coda),
                WaveformPick::new(PickType::Ap, id, ap),
            ],
        };
        PeakVelocityMeasurement {
            waveform,
            noise_level: -1.0,
            distance_km: 100.0,
            velocity: start_amp,
            snr: start_amp + 1.0,
            time_secs_from_origin: ap,
        }
    }

    #[test]
    fn fits_the_coda_decay_line() {
        let out = measure_spectra(&[measurement(1, "ANMO", 2.0, -0.02, 0.0)], &params_map());
        assert_eq!(out.len(), 1);
        let m = &out[0];

        assert!((m.raw_at_start - 2.0).abs() < 0.01, "start {}", m.raw_at_start);
        // 60 s of decay at -0.02/s.
        assert!(
            (m.raw_at_measurement_time - 0.8).abs() < 0.01,
            "end {}",
            m.raw_at_measurement_time
        );
        // Path term for 100 km is exactly 2.
        assert!(
            (m.path_corrected - 2.8).abs() < 0.01,
            "path corrected {}",
            m.path_corrected
        );
    }

    #[test]
    fn failed_end_pick_is_skipped() {
        let mut bad = measurement(1, "ANMO", 2.0, -0.02, 0.0);
        for pick in &mut bad.waveform.associated_picks {
            if pick.pick_type == PickType::F {
                pick.pick_time_sec_from_origin = 0.0;
            }
        }
        let out = measure_spectra(&[bad], &params_map());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_picks_are_skipped() {
        let mut unpicked = measurement(1, "ANMO", 2.0, -0.02, 0.0);
        unpicked.waveform.associated_picks.clear();
        let out = measure_spectra(&[unpicked], &params_map());
        assert!(out.is_empty());
    }

    #[test]
    fn site_term_removes_a_station_bias() {
        // Two stations, one with a constant +0.5 amplitude bias.
        let batch = vec![
            measurement(1, "ANMO", 2.0, -0.02, 0.0),
            measurement(2, "ANMO", 2.2, -0.02, 0.0),
            measurement(3, "BIAS", 2.0, -0.02, 0.5),
            measurement(4, "BIAS", 2.2, -0.02, 0.5),
        ];
        let out = measure_spectra(&batch, &params_map());
        assert_eq!(out.len(), 4);

        let mean_of = |station: u64, other: u64| {
            let a = out.iter().find(|m| m.waveform_id == station);
            let b = out.iter().find(|m| m.waveform_id == other);
            match (a, b) {
                (Some(a), Some(b)) => (a.path_and_site_corrected + b.path_and_site_corrected) / 2.0,
                _ => f64::NAN,
            }
        };
        let anmo = mean_of(1, 2);
        let bias = mean_of(3, 4);
        assert!(
            (anmo - bias).abs() < 1e-9,
            "site terms should equalize station means: {anmo} vs {bias}"
        );
    }
}
