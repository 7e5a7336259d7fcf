//! Identity error types
//!
//! One enum for the whole crate, with time and authorization failures split out
//! so callers can tell "retry after clock skew" from "permanently unauthorized".

use chrono::{DateTime, Utc};
use replidentity_paserk::PaserkError;

use crate::claims::ScopeField;

/// Certificate validity window failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("certificate not valid until {issued_at} (now {now})")]
    NotYetValid {
        issued_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("certificate expired at {expires_at} (now {now})")]
    Expired {
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

/// Claim scope failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("not authorized ({0})")]
    Unauthorized(ScopeField),

    #[error("signing cert does not authorize claim: {claim}")]
    ClaimNotAuthorized { claim: String },

    #[error("signing cert doesn't have authority to sign intermediate certs")]
    NotAuthorizedToSignIntermediate,
}

/// Errors returned by verification and signing
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Key material could not be decoded
    #[error(transparent)]
    Paserk(#[from] PaserkError),

    /// The key source had no key for the token's signer
    #[error("no public key found for key id {key_id} (issuer {issuer})")]
    UnknownKey { key_id: String, issuer: String },

    /// Token signature did not verify
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Token string is structurally broken
    #[error("malformed token: {message}")]
    MalformedToken { message: String },

    /// Certificate, identity or authority bytes inside the chain are unreadable
    #[error("malformed certificate chain: {message}")]
    MalformedChain { message: String },

    /// More nested certificates than the verifier accepts
    #[error("certificate chain is deeper than {max} certificates")]
    ChainTooDeep { max: usize },

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Bare token presented where a type-aware identity token is required
    #[error("wrong type of token provided")]
    WrongTokenType,

    #[error("message identity mismatch. expected {expected}, got {actual}")]
    AudienceMismatch { expected: String, actual: String },

    #[error("identity origin replid does not match. expected {expected}; got {actual}")]
    OriginMismatch { expected: String, actual: String },

    #[error("message replid mismatch. expected {expected}, got {actual}")]
    SelfReplidMismatch { expected: String, actual: String },

    #[error("message audience mismatch. expected {expected}, got {actual}")]
    SelfAudienceMismatch { expected: String, actual: String },

    /// Missing or unusable configuration at bootstrap
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A caller-supplied verification predicate rejected the identity
    #[error("identity rejected: {message}")]
    Rejected { message: String },
}

impl IdentityError {
    /// Create a malformed token error
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    /// Create a malformed chain error
    pub fn malformed_chain(message: impl Into<String>) -> Self {
        Self::MalformedChain {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a rejection for use inside custom verification predicates
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
