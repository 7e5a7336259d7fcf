//! PASERK ID operation
//!
//! <https://github.com/paseto-standard/paserk/blob/master/operations/ID.md>

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use blake2::digest::consts::U33;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{SigningKey, VerifyingKey};
use replidentity_proto::{GovalSigningAuthority, Message};

use crate::keys::{private_key_to_paserk_secret, public_key_to_paserk_public};
use crate::{PASERK_GSAID_HEADER, PASERK_PID_HEADER, PASERK_SID_HEADER};

/// BLAKE2b with a 264-bit digest, as the ID operation requires.
type Blake2b264 = Blake2b<U33>;

/// Compute `header || base64url(BLAKE2b-264(header || payload))`.
pub fn id(header: &str, payload: impl AsRef<[u8]>) -> String {
    let mut hasher = Blake2b264::new();
    hasher.update(header.as_bytes());
    hasher.update(payload.as_ref());
    let digest = hasher.finalize();

    format!("{header}{}", URL_SAFE_NO_PAD.encode(digest))
}

/// `k2.pid.` ID of a public key
pub fn pid(key: &VerifyingKey) -> String {
    id(PASERK_PID_HEADER, public_key_to_paserk_public(key).as_str())
}

/// `k2.sid.` ID of a private key
pub fn sid(key: &SigningKey) -> String {
    id(PASERK_SID_HEADER, private_key_to_paserk_secret(key).as_str())
}

/// `k2.gsaid.` ID of a signing authority descriptor
///
/// Hashes the base64url text of the descriptor's wire encoding, so two
/// descriptors share an ID exactly when they serialize identically.
pub fn gsaid(authority: &GovalSigningAuthority) -> String {
    let serialized = URL_SAFE_NO_PAD.encode(authority.encode_to_vec());
    id(PASERK_GSAID_HEADER, serialized)
}
