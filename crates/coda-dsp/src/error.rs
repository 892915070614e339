use thiserror::Error;

/// Errors originating from the DSP kernels.
#[derive(Error, Debug)]
pub enum DspError {
    /// A cut window with start >= end.
    #[error("degenerate cut window: start {start} >= end {end}")]
    InvalidWindow {
        /// Window start, epoch seconds.
        start: f64,
        /// Window end, epoch seconds.
        end: f64,
    },

    /// A cut window lying entirely outside the series range.
    #[error("cut window [{start}, {end}] does not overlap series [{series_start}, {series_end}]")]
    CutOutOfBounds {
        start: f64,
        end: f64,
        series_start: f64,
        series_end: f64,
    },

    /// A non-positive resample rate.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// A filter specification the design routine cannot realize.
    #[error("unrealizable filter: {0}")]
    FilterDesign(String),
}
