//! Instantaneous envelope via the analytic signal.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Replace `data` with the magnitude of its analytic signal.
///
/// The analytic signal is built in the frequency domain: forward FFT, zero
/// the negative frequencies, double the positive ones (DC and Nyquist kept
/// as is), inverse FFT. The magnitude of the result is the instantaneous
/// envelope, which is non-negative by construction.
///
/// Series shorter than two samples are left untouched.
pub fn envelope_in_place(data: &mut [f64]) {
    let n = data.len();
    if n < 2 {
        for x in data.iter_mut() {
            *x = x.abs();
        }
        return;
    }

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex64> = data.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    forward.process(&mut spectrum);

    // Analytic-signal weights: keep DC (and Nyquist for even n), double the
    // positive frequencies, zero the negative ones.
    let half = n / 2;
    if n % 2 == 0 {
        for bin in spectrum.iter_mut().take(half).skip(1) {
            *bin *= 2.0;
        }
        for bin in spectrum.iter_mut().skip(half + 1) {
            *bin = Complex64::new(0.0, 0.0);
        }
    } else {
        for bin in spectrum.iter_mut().take(half + 1).skip(1) {
            *bin *= 2.0;
        }
        for bin in spectrum.iter_mut().skip(half + 1) {
            *bin = Complex64::new(0.0, 0.0);
        }
    }

    inverse.process(&mut spectrum);

    // rustfft leaves the inverse unscaled.
    let scale = 1.0 / n as f64;
    for (x, c) in data.iter_mut().zip(spectrum.iter()) {
        *x = c.norm() * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn sine_envelope_is_flat() {
        let rate = 40.0;
        let n = 2048;
        let mut data: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 2.0 * i as f64 / rate).sin())
            .collect();
        envelope_in_place(&mut data);
        // Away from the ends the envelope of a unit sine is ~1.
        for (i, &x) in data.iter().enumerate().skip(100).take(n - 200) {
            assert!((x - 1.0).abs() < 0.05, "envelope {x} at sample {i}");
        }
    }

    #[test]
    fn scaled_sine_envelope_tracks_amplitude() {
        let rate = 40.0;
        let n = 1024;
        let mut data: Vec<f64> = (0..n)
            .map(|i| 3.5 * (2.0 * PI * 3.0 * i as f64 / rate).sin())
            .collect();
        envelope_in_place(&mut data);
        let mid = data[n / 2];
        assert!((mid - 3.5).abs() < 0.2, "mid-trace envelope {mid}");
    }

    #[test]
    fn envelope_is_non_negative() {
        let mut data: Vec<f64> = (0..500).map(|i| ((i * 7919) % 13) as f64 - 6.0).collect();
        envelope_in_place(&mut data);
        assert!(data.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn degenerate_lengths() {
        let mut empty: Vec<f64> = Vec::new();
        envelope_in_place(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![-2.0];
        envelope_in_place(&mut single);
        assert!((single[0] - 2.0).abs() < f64::EPSILON);
    }
}
