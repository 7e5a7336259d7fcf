//! Public key sources for root signing keys

use std::collections::HashMap;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use serde::Deserialize;

use crate::error::{IdentityError, Result};

/// Looks up the root public key named by a token's signing authority
///
/// Returning `None` makes verification fail with
/// [`IdentityError::UnknownKey`]. Closures of the shape
/// `Fn(&str, &str) -> Option<VerifyingKey>` implement this trait.
pub trait PubKeySource {
    fn public_key(&self, key_id: &str, issuer: &str) -> Option<VerifyingKey>;
}

impl<F> PubKeySource for F
where
    F: Fn(&str, &str) -> Option<VerifyingKey>,
{
    fn public_key(&self, key_id: &str, issuer: &str) -> Option<VerifyingKey> {
        self(key_id, issuer)
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct RawKeyMap(HashMap<String, String>);

/// In-memory key ID to public key map, typically parsed from `REPL_PUBKEYS`
///
/// The issuer is not consulted; key IDs are globally unique.
#[derive(Debug, Clone, Default)]
pub struct PublicKeyMap {
    keys: HashMap<String, VerifyingKey>,
}

impl PublicKeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of key ID to base64 encoded public key
    ///
    /// Entries whose value is not a valid Ed25519 key are skipped with a warning
    /// and will resolve as unknown.
    pub fn from_json(json: &str) -> Result<Self> {
        let RawKeyMap(raw) = serde_json::from_str(json)
            .map_err(|e| IdentityError::config(format!("public key map is not valid JSON: {e}")))?;

        let mut keys = HashMap::with_capacity(raw.len());
        for (key_id, encoded) in raw {
            match decode_public_key(&encoded) {
                Some(key) => {
                    keys.insert(key_id, key);
                }
                None => {
                    tracing::warn!(key_id = %key_id, "Skipping undecodable public key");
                }
            }
        }

        Ok(Self { keys })
    }

    /// Add or replace a key
    pub fn insert(&mut self, key_id: impl Into<String>, key: VerifyingKey) {
        self.keys.insert(key_id.into(), key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl PubKeySource for PublicKeyMap {
    fn public_key(&self, key_id: &str, _issuer: &str) -> Option<VerifyingKey> {
        self.keys.get(key_id).copied()
    }
}

/// Raw key bytes are published as base64url; standard base64 is accepted too.
fn decode_public_key(encoded: &str) -> Option<VerifyingKey> {
    let raw = URL_SAFE_NO_PAD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .or_else(|_| STANDARD.decode(encoded))
        .ok()?;
    let raw: [u8; PUBLIC_KEY_LENGTH] = raw.as_slice().try_into().ok()?;
    VerifyingKey::from_bytes(&raw).ok()
}
