use thiserror::Error;

use super::ExtractionFailure;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Detection failure: {0}")]
    DetectionFailure(String),

    #[error("No face detected")]
    NoFaceDetected,

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Data corruption: {0}")]
    DataCorruption(String),

    #[error("Validation failure: {0}")]
    ValidationFailure(String),
}

/// Stable identifier for each error variant, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TransportFailure,
    MalformedOutput,
    DetectionFailure,
    NoFaceDetected,
    PersistenceFailure,
    DataCorruption,
    ValidationFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::DetectionFailure => "detection_failure",
            ErrorKind::NoFaceDetected => "no_face_detected",
            ErrorKind::PersistenceFailure => "persistence_failure",
            ErrorKind::DataCorruption => "data_corruption",
            ErrorKind::ValidationFailure => "validation_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl DomainError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedOutput(msg.into())
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::DetectionFailure(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure(msg.into())
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::DataCorruption(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailure(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransportFailure(_) => ErrorKind::TransportFailure,
            Self::MalformedOutput(_) => ErrorKind::MalformedOutput,
            Self::DetectionFailure(_) => ErrorKind::DetectionFailure,
            Self::NoFaceDetected => ErrorKind::NoFaceDetected,
            Self::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            Self::DataCorruption(_) => ErrorKind::DataCorruption,
            Self::ValidationFailure(_) => ErrorKind::ValidationFailure,
        }
    }

    /// Human-readable detail without the kind prefix.
    pub fn details(&self) -> String {
        match self {
            Self::TransportFailure(msg)
            | Self::MalformedOutput(msg)
            | Self::DetectionFailure(msg)
            | Self::PersistenceFailure(msg)
            | Self::DataCorruption(msg)
            | Self::ValidationFailure(msg) => msg.clone(),
            Self::NoFaceDetected => "No face detected".to_string(),
        }
    }

    /// True when the generator ran but produced no usable embedding.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::DetectionFailure(_) | Self::NoFaceDetected)
    }
}

impl From<ExtractionFailure> for DomainError {
    fn from(failure: ExtractionFailure) -> Self {
        match failure {
            ExtractionFailure::Execution { reason, output } => {
                if output.trim().is_empty() {
                    Self::TransportFailure(reason)
                } else {
                    Self::TransportFailure(format!("{}\nOutput was: {}", reason, output.trim()))
                }
            }
            ExtractionFailure::MalformedOutput { reason } => Self::MalformedOutput(reason),
            ExtractionFailure::Detection(msg) => Self::DetectionFailure(msg),
            ExtractionFailure::NoFaceDetected => Self::NoFaceDetected,
        }
    }
}
