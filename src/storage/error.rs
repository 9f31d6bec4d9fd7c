use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink refused a single create/record call
    #[error("Recording failed for {operation}: {reason}")]
    RecordingFailure { operation: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown {what} id {id}")]
    UnknownId { what: &'static str, id: u32 },

    #[error("Failed to allocate {0} id: maximum count reached")]
    IdExhausted(&'static str),

    #[error("Sink is already closed")]
    Closed,
}

impl SinkError {
    pub fn recording(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RecordingFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

pub type SinkResult<T> = Result<T, SinkError>;
