//! PASERK key encoding
//!
//! Compact, header-prefixed text encodings for Ed25519 key material and the
//! content-addressed identifiers derived from them:
//!
//! | Header | Payload |
//! |--------|---------|
//! | `k2.public.` | base64url Ed25519 public key, always 53 characters |
//! | `k2.secret.` | base64url Ed25519 keypair (seed + public), always 96 characters |
//! | `k2.pid.` | ID of a `k2.public.` encoding |
//! | `k2.sid.` | ID of a `k2.secret.` encoding |
//! | `k2.gsaid.` | ID of a serialized signing authority descriptor (project extension) |
//!
//! Every decode is total: malformed input yields a [`PaserkError`], never a panic.
//! See <https://github.com/paseto-standard/paserk> for the standard types.

pub mod error;
pub mod id;
pub mod keys;
pub mod pem;

pub use error::{PaserkError, Result};
pub use id::{gsaid, id, pid, sid};
pub use keys::{
    paserk_public_to_public_key, paserk_secret_to_private_key, private_key_to_paserk_secret,
    public_key_to_paserk_public, PaserkPublic, PaserkSecret,
};
pub use pem::pem_to_public_key;

/// Header of a PASERK public key.
pub const PASERK_PUBLIC_HEADER: &str = "k2.public.";

/// Header of a PASERK secret key.
pub const PASERK_SECRET_HEADER: &str = "k2.secret.";

/// Header of a PASERK secret key ID.
pub const PASERK_SID_HEADER: &str = "k2.sid.";

/// Header of a PASERK public key ID.
pub const PASERK_PID_HEADER: &str = "k2.pid.";

/// Header of a signing authority ID. Not part of the PASERK standard.
pub const PASERK_GSAID_HEADER: &str = "k2.gsaid.";

/// Exact length of an encoded `k2.public.` string.
pub const PASERK_PUBLIC_LENGTH: usize = 53;

/// Exact length of an encoded `k2.secret.` string.
pub const PASERK_SECRET_LENGTH: usize = 96;
