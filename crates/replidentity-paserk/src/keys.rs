//! `k2.public.` and `k2.secret.` encodings of Ed25519 keys

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH};
use zeroize::Zeroizing;

use crate::error::{PaserkError, Result};
use crate::{PASERK_PUBLIC_HEADER, PASERK_PUBLIC_LENGTH, PASERK_SECRET_HEADER, PASERK_SECRET_LENGTH};

/// Length of an Ed25519 keypair (seed followed by public key).
const KEYPAIR_LENGTH: usize = 64;

/// PASERK encoding of an Ed25519 public key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaserkPublic(String);

impl PaserkPublic {
    /// Borrow the encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back into a verifying key
    pub fn to_public_key(&self) -> Result<VerifyingKey> {
        paserk_public_to_public_key(&self.0)
    }
}

impl fmt::Display for PaserkPublic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PaserkPublic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PaserkPublic {
    type Err = PaserkError;

    fn from_str(s: &str) -> Result<Self> {
        paserk_public_to_public_key(s)?;
        Ok(Self(s.to_string()))
    }
}

impl From<PaserkPublic> for String {
    fn from(value: PaserkPublic) -> Self {
        value.0
    }
}

/// PASERK encoding of an Ed25519 keypair. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PaserkSecret(Zeroizing<String>);

impl PaserkSecret {
    /// Borrow the encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back into a signing key
    pub fn to_private_key(&self) -> Result<SigningKey> {
        paserk_secret_to_private_key(&self.0)
    }
}

impl fmt::Debug for PaserkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PaserkSecret(<redacted>)")
    }
}

impl FromStr for PaserkSecret {
    type Err = PaserkError;

    fn from_str(s: &str) -> Result<Self> {
        paserk_secret_to_private_key(s)?;
        Ok(Self(Zeroizing::new(s.to_string())))
    }
}

/// Wrap a public key into its PASERK representation
pub fn public_key_to_paserk_public(key: &VerifyingKey) -> PaserkPublic {
    PaserkPublic(format!(
        "{PASERK_PUBLIC_HEADER}{}",
        URL_SAFE_NO_PAD.encode(key.as_bytes())
    ))
}

/// Unwrap a public key from its PASERK representation
pub fn paserk_public_to_public_key(encoded: &str) -> Result<VerifyingKey> {
    let payload = encoded.strip_prefix(PASERK_PUBLIC_HEADER).ok_or_else(|| {
        PaserkError::format(format!(
            "{encoded} does not have the {PASERK_PUBLIC_HEADER} header"
        ))
    })?;

    if encoded.len() != PASERK_PUBLIC_LENGTH {
        return Err(PaserkError::format(format!(
            "{encoded} is not the expected length of {PASERK_PUBLIC_LENGTH}"
        )));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| PaserkError::format(format!("{encoded} is not valid base64url: {e}")))?;

    let raw: [u8; PUBLIC_KEY_LENGTH] = raw.as_slice().try_into().map_err(|_| {
        PaserkError::format(format!(
            "decoded public key is {} bytes, expected {PUBLIC_KEY_LENGTH}",
            raw.len()
        ))
    })?;

    VerifyingKey::from_bytes(&raw).map_err(|e| PaserkError::invalid_key(e.to_string()))
}

/// Wrap a private key into its PASERK representation
pub fn private_key_to_paserk_secret(key: &SigningKey) -> PaserkSecret {
    let keypair = Zeroizing::new(key.to_keypair_bytes());
    PaserkSecret(Zeroizing::new(format!(
        "{PASERK_SECRET_HEADER}{}",
        URL_SAFE_NO_PAD.encode(keypair.as_slice())
    )))
}

/// Unwrap a private key from its PASERK representation
///
/// Error messages never include the encoded secret.
pub fn paserk_secret_to_private_key(encoded: &str) -> Result<SigningKey> {
    let payload = encoded.strip_prefix(PASERK_SECRET_HEADER).ok_or_else(|| {
        PaserkError::format(format!(
            "secret key does not have the {PASERK_SECRET_HEADER} header"
        ))
    })?;

    if encoded.len() != PASERK_SECRET_LENGTH {
        return Err(PaserkError::format(format!(
            "secret key is {} characters, not the expected length of {PASERK_SECRET_LENGTH}",
            encoded.len()
        )));
    }

    let raw = Zeroizing::new(
        URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| PaserkError::format("secret key payload is not valid base64url"))?,
    );

    let keypair: &[u8; KEYPAIR_LENGTH] = raw.as_slice().try_into().map_err(|_| {
        PaserkError::format(format!(
            "decoded secret key is {} bytes, expected {KEYPAIR_LENGTH}",
            raw.len()
        ))
    })?;

    SigningKey::from_keypair_bytes(keypair).map_err(|e| PaserkError::invalid_key(e.to_string()))
}
