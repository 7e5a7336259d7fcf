//! Replidentity wire schema
//!
//! Protobuf-compatible message types carried inside identity tokens:
//! - [`GovalSigningAuthority`]: the token footer, naming who signed the token
//! - [`GovalCert`]: a time-bounded, claims-bearing certificate (itself a token body)
//! - [`GovalReplIdentity`]: the identity proven by a leaf token
//!
//! Field tags match the upstream signing schema so tokens minted by existing
//! issuers decode unchanged. Encoding and decoding go through [`prost::Message`].

pub mod signing;

pub use signing::{
    certificate_claim, goval_signing_authority, CertificateClaim, FlagClaim, GovalCert,
    GovalReplIdentity, GovalSigningAuthority, Timestamp, TokenVersion,
};

pub use prost::Message;
