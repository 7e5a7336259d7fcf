//! PASERK error type

/// Errors produced while encoding or decoding key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaserkError {
    /// Missing header, wrong length, or undecodable payload
    #[error("Invalid PASERK: {message}")]
    Format {
        /// What was wrong with the input
        message: String,
    },

    /// The key is well-formed but not Ed25519
    #[error("Unsupported key type: {algorithm}")]
    UnsupportedKeyType {
        /// Algorithm identifier found in the key
        algorithm: String,
    },

    /// Decoded bytes do not form a valid Ed25519 key
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Reason the key was rejected
        message: String,
    },
}

impl PaserkError {
    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an unsupported key type error
    pub fn unsupported_key_type(algorithm: impl Into<String>) -> Self {
        Self::UnsupportedKeyType {
            algorithm: algorithm.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

/// Result type for PASERK operations
pub type Result<T> = std::result::Result<T, PaserkError>;
