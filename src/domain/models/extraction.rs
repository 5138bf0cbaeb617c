use super::Embedding;

/// Why the embedding generator did not yield a usable vector.
///
/// `NoFaceDetected` means the generator ran and succeeded but found nothing,
/// which callers must keep apart from `Execution`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionFailure {
    /// The generator could not be started, exited with an error or timed out.
    Execution { reason: String, output: String },
    /// No payload could be located, or it did not match the expected schema.
    MalformedOutput { reason: String },
    /// The generator reported `success: false` with its own error text.
    Detection(String),
    /// `success: true` with an empty embedding.
    NoFaceDetected,
}

impl ExtractionFailure {
    pub fn execution(reason: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
            output: output.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            reason: reason.into(),
        }
    }
}

pub type EmbeddingResult = Result<Embedding, ExtractionFailure>;
