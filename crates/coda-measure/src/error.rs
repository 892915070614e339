use thiserror::Error;

/// Batch-level errors from the measurement pipelines.
///
/// These abort a whole call and surface as `JobResult` failure messages.
/// Per-unit numerical errors never appear here; they are logged and the
/// unit is dropped.
#[derive(Error, Debug)]
pub enum MeasureError {
    /// The input collection was empty.
    #[error("No waveforms provided; unable to compute envelopes.")]
    NoWaveforms,

    /// No job configuration was given and no default is configured.
    #[error("No configuration specified but is required for this endpoint; unable to compute envelopes.")]
    NoConfiguration,
}
