//! Error handling for the planwire-common crate.

use thiserror::Error;

/// Error type shared by the registries, the plan streams and the session
/// configuration.
///
/// None of these errors are retried by the protocol: they describe either a
/// registration defect, a writer/reader skew or corrupted input, and are
/// always surfaced to the caller.
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Duplicate registration: [{category}] already has an entry named [{name}]")]
    DuplicateName { category: String, name: String },

    #[error("Unregistered type: no [{category}] entry named [{name}] is available for writing")]
    UnregisteredType { category: String, name: String },

    #[error("Unknown name: no [{category}] entry named [{name}]")]
    UnknownName { category: String, name: String },

    #[error("Encoding failed: {message}")]
    EncodingIo {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Decoding failed: {message}")]
    DecodingIo {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Configuration mismatch: {message}")]
    ConfigurationMismatch { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigurationError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Result type alias for common operations.
pub type Result<T> = std::result::Result<T, CommonError>;

/// Error severity levels for categorizing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The current encode or decode call must be aborted
    High,
    /// The process is misconfigured and should not start
    Critical,
}

/// Error category for grouping related error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Registry construction and lookup
    Registration,
    /// Byte level encoding and decoding
    DataProcessing,
    /// Session configuration problems
    Configuration,
    /// Internal logic errors
    Internal,
}

/// Trait for error diagnostics.
pub trait Diagnose {
    /// Get the error severity level.
    fn severity(&self) -> ErrorSeverity;

    /// Get the error category.
    fn category(&self) -> ErrorCategory;

    /// Get suggestions for resolving the error.
    fn suggestions(&self) -> Vec<String>;

    /// Check if the error is retryable.
    fn is_retryable(&self) -> bool;
}

impl CommonError {
    /// Create a duplicate registration error.
    pub fn duplicate_name<C: Into<String>, N: Into<String>>(category: C, name: N) -> Self {
        Self::DuplicateName {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Create an error for a value whose declared name has no registry entry.
    pub fn unregistered_type<C: Into<String>, N: Into<String>>(category: C, name: N) -> Self {
        Self::UnregisteredType {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Create an error for a name read from the wire that has no registry entry.
    pub fn unknown_name<C: Into<String>, N: Into<String>>(category: C, name: N) -> Self {
        Self::UnknownName {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Create an encoding error with a custom message.
    pub fn encoding_error<S: Into<String>>(message: S) -> Self {
        Self::EncodingIo {
            message: message.into(),
            source: None,
        }
    }

    /// Create an encoding error with a custom message and source error.
    pub fn encoding_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::EncodingIo {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a decoding error with a custom message.
    pub fn decoding_error<S: Into<String>>(message: S) -> Self {
        Self::DecodingIo {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decoding error with a custom message and source error.
    pub fn decoding_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::DecodingIo {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a configuration mismatch error.
    pub fn configuration_mismatch<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationMismatch {
            message: message.into(),
        }
    }

    /// Create a configuration error with a custom message.
    pub fn configuration_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with a custom message and source error.
    pub fn configuration_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl Diagnose for CommonError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            CommonError::DuplicateName { .. } => ErrorSeverity::Critical,
            CommonError::UnregisteredType { .. } => ErrorSeverity::High,
            CommonError::UnknownName { .. } => ErrorSeverity::High,
            CommonError::EncodingIo { .. } => ErrorSeverity::High,
            CommonError::DecodingIo { .. } => ErrorSeverity::High,
            CommonError::ConfigurationMismatch { .. } => ErrorSeverity::High,
            CommonError::ConfigurationError { .. } => ErrorSeverity::Critical,
            CommonError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            CommonError::DuplicateName { .. } => ErrorCategory::Registration,
            CommonError::UnregisteredType { .. } => ErrorCategory::Registration,
            CommonError::UnknownName { .. } => ErrorCategory::Registration,
            CommonError::EncodingIo { .. } => ErrorCategory::DataProcessing,
            CommonError::DecodingIo { .. } => ErrorCategory::DataProcessing,
            CommonError::ConfigurationMismatch { .. } => ErrorCategory::Configuration,
            CommonError::ConfigurationError { .. } => ErrorCategory::Configuration,
            CommonError::InternalError { .. } => ErrorCategory::Internal,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            CommonError::DuplicateName { .. } => vec![
                "Remove the repeated entry from the registration list".to_string(),
                "Names only need to be unique within one category".to_string(),
            ],
            CommonError::UnregisteredType { .. } => vec![
                "Add an entry for the type to the registry used by the writer".to_string(),
            ],
            CommonError::UnknownName { .. } => vec![
                "Check that writer and reader were built from the same entry list".to_string(),
                "Check the transport version of both sides".to_string(),
            ],
            CommonError::EncodingIo { .. } => {
                vec!["Check the sink the plan stream writes into".to_string()]
            }
            CommonError::DecodingIo { .. } => vec![
                "Verify the input was produced by a plan stream writer".to_string(),
                "Check for truncated transfers".to_string(),
            ],
            CommonError::ConfigurationMismatch { .. } => vec![
                "Use the same session configuration for writing and reading".to_string(),
            ],
            CommonError::ConfigurationError { .. } => vec![
                "Review configuration file syntax and values".to_string(),
                "Check for missing required configuration parameters".to_string(),
            ],
            CommonError::InternalError { .. } => {
                vec!["This indicates a bug in a node codec".to_string()]
            }
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extension trait for attaching encode/decode context to foreign errors.
pub mod context {
    use super::*;

    pub trait ErrorContext<T> {
        /// Wrap the error as an encoding failure.
        fn with_encoding_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String;

        /// Wrap the error as a decoding failure.
        fn with_decoding_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String;
    }

    impl<T, E> ErrorContext<T> for std::result::Result<T, E>
    where
        E: Into<anyhow::Error>,
    {
        fn with_encoding_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String,
        {
            self.map_err(|e| CommonError::encoding_error_with_source(f(), e))
        }

        fn with_decoding_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String,
        {
            self.map_err(|e| CommonError::decoding_error_with_source(f(), e))
        }
    }
}
