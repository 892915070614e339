use thiserror::Error;

/// Errors originating from the domain model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A frequency band with low >= high or non-positive corners.
    #[error("invalid frequency band: [{low}, {high}] Hz")]
    InvalidBand {
        /// Low corner in Hz.
        low: f64,
        /// High corner in Hz.
        high: f64,
    },

    /// A job configuration with no band entries.
    #[error("job configuration contains no frequency bands")]
    EmptyConfiguration,

    /// A non-positive smoothing window.
    #[error("invalid smoothing window: {0} s")]
    InvalidSmoothing(f64),
}
