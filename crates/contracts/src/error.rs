//! Layered error definitions
//!
//! Categorized by source: config / input / queue / aggregation / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum PipelineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// Unparseable input record; the source cursor has already advanced
    /// past it, so callers may skip and continue
    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    /// Timestamp outside the representable range; the reading is skipped
    #[error("invalid timestamp: {timestamp}")]
    InvalidTimestamp { timestamp: i64 },

    /// Input stream read failure (fatal for the calling worker)
    #[error("source read error: {message}")]
    SourceRead { message: String },

    // ===== Queue Errors =====
    /// Push attempted after the queue was closed (orderly-shutdown signal)
    #[error("queue closed")]
    QueueClosed,

    /// Pipeline cancelled while waiting
    #[error("pipeline cancelled")]
    Cancelled,

    // ===== Aggregation Errors =====
    /// Internal invariant violation; the pipeline stops rather than
    /// produce a silently wrong ranking
    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create malformed record error
    pub fn malformed_record(line: u64, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            message: message.into(),
        }
    }

    /// Create source read error
    pub fn source_read(message: impl Into<String>) -> Self {
        Self::SourceRead {
            message: message.into(),
        }
    }

    /// Create invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error is local to one record (skip-with-log is a
    /// valid recovery) rather than fatal for the pipeline.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. } | Self::InvalidTimestamp { .. }
        )
    }
}
