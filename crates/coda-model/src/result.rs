use serde::{Deserialize, Serialize};

/// Batch result envelope: a success flag, human-readable error messages, and
/// the payload produced so far.
///
/// Batch pipelines degrade to partial results rather than failing a
/// multi-thousand-item job on one bad waveform, so a successful `JobResult`
/// may carry fewer items than the input. Failure is reserved for batch-level
/// configuration errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobResult<T> {
    pub success: bool,
    pub messages: Vec<String>,
    pub payload: T,
}

impl<T> JobResult<T> {
    /// A successful result carrying `payload`.
    #[must_use]
    pub fn success(payload: T) -> Self {
        Self {
            success: true,
            messages: Vec::new(),
            payload,
        }
    }

    /// A failed result with one descriptive message.
    #[must_use]
    pub fn failure(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_message() {
        let result: JobResult<Vec<u32>> = JobResult::failure("no input", Vec::new());
        assert!(!result.success);
        assert_eq!(result.messages, vec!["no input".to_owned()]);
        assert!(result.payload.is_empty());
    }
}
