//! Error types for sign-stream.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame payload decode errors. Always recoverable: the frame is dropped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Empty frame payload")]
    Empty,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unreadable image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Decode task failed: {0}")]
    TaskFailed(String),
}

/// Hand-landmark engine errors. Fatal to the session that owns the engine.
#[derive(Debug, thiserror::Error)]
pub enum PerceptionError {
    #[error("Hand landmark model not found: {path}")]
    ModelNotFound { path: String },

    #[error("Engine {engine} detection failed: {reason}")]
    DetectFailed { engine: String, reason: String },

    #[error("Engine {engine} returned a hand with {count} landmarks, expected 21")]
    MalformedHand { engine: String, count: usize },
}

/// Classifier strategy errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Perception failed: {0}")]
    Perception(#[from] PerceptionError),

    #[error("Classifier {classifier} does not accept {input} input")]
    UnsupportedInput {
        classifier: String,
        input: String,
    },

    #[error("No clip model registered for the clip backend")]
    ModelMissing,

    #[error("Clip model inference failed: {0}")]
    Inference(String),

    #[error("Clip model returned {got} logits, class list has {expected} entries")]
    LogitShape { got: usize, expected: usize },

    #[error("Invalid class list at line {line}: {reason}")]
    ClassList { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Classifier worker is gone")]
    WorkerGone,
}

/// Per-connection session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Classifier failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Failed to start classifier worker: {reason}")]
    WorkerStart { reason: String },

    #[error("Worker shutdown timed out after {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    #[error("Outbound channel closed")]
    OutboundClosed,
}
