//! Conversion error types.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while transcoding media.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Input bytes could not be decoded.
    #[error("failed to decode {filename}: {message}")]
    Decode {
        /// Input filename.
        filename: String,
        /// Decoder message.
        message: String,
    },

    /// Encoding the output failed.
    #[error("failed to encode {filename}: {message}")]
    Encode {
        /// Input filename.
        filename: String,
        /// Encoder message.
        message: String,
    },

    /// The external encoder binary is not on `PATH`.
    #[error("encoder not found: {program} is not on PATH")]
    EncoderNotFound {
        /// Program that was looked up.
        program: String,
    },

    /// The external encoder exited unsuccessfully.
    #[error("encoder failed ({status}): {stderr}")]
    EncoderFailed {
        /// Exit status.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },

    /// The external encoder ran past its deadline and was killed.
    #[error("encoder timed out after {secs}s")]
    Timeout {
        /// Deadline in seconds.
        secs: u64,
    },

    /// Temp file or process I/O failed.
    #[error("conversion I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker panicked or was cancelled.
    #[error("conversion task failed: {0}")]
    TaskFailed(String),
}

impl ConversionError {
    /// Create a decode error.
    #[must_use]
    pub fn decode(filename: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            filename: filename.into(),
            message: err.to_string(),
        }
    }

    /// Create an encode error.
    #[must_use]
    pub fn encode(filename: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            filename: filename.into(),
            message: err.to_string(),
        }
    }

    /// Create an encoder-not-found error.
    #[must_use]
    pub fn encoder_not_found(program: impl Into<String>) -> Self {
        Self::EncoderNotFound {
            program: program.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_not_found_message() {
        let err = ConversionError::encoder_not_found("ffmpeg");
        assert!(err.to_string().contains("encoder not found"));
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            ConversionError::Timeout { secs: 600 }.to_string(),
            "encoder timed out after 600s"
        );
    }
}
