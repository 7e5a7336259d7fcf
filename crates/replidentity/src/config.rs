//! Environment-backed bootstrap
//!
//! Every repl is started with its identity credentials in the environment.
//! [`IdentityConfig`] captures them once so the rest of the crate never reads
//! the process environment; the free functions at the bottom are thin
//! wrappers for the common case.

use std::fmt;

use ed25519_dalek::VerifyingKey;
use zeroize::Zeroizing;

use crate::clock::{Clock, SystemClock};
use crate::error::{IdentityError, Result};
use crate::keys::{PubKeySource, PublicKeyMap};
use crate::sign::SigningAuthority;

/// The repl's own identity token
pub const ENV_IDENTITY: &str = "REPL_IDENTITY";
/// PASERK secret key matching the identity token's certificate
pub const ENV_IDENTITY_KEY: &str = "REPL_IDENTITY_KEY";
/// The repl's own ID
pub const ENV_REPL_ID: &str = "REPL_ID";
/// Owner of the repl
pub const ENV_OWNER: &str = "REPL_OWNER";
/// JSON map of root key ID to base64url public key
pub const ENV_PUBKEYS: &str = "REPL_PUBKEYS";

/// Owner value of a repl run by a visitor who is not logged in
pub const ANONYMOUS_OWNER: &str = "five-nine";

/// Identity credentials of the current repl
#[derive(Clone, Default)]
pub struct IdentityConfig {
    pub identity: String,
    pub identity_key: Zeroizing<String>,
    pub replid: String,
    pub owner: Option<String>,
    pub public_keys: Option<String>,
}

impl IdentityConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps variable names to values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            identity: lookup(ENV_IDENTITY).unwrap_or_default(),
            identity_key: Zeroizing::new(lookup(ENV_IDENTITY_KEY).unwrap_or_default()),
            replid: lookup(ENV_REPL_ID).unwrap_or_default(),
            owner: lookup(ENV_OWNER),
            public_keys: lookup(ENV_PUBKEYS),
        }
    }

    /// Check that the credentials needed for signing are present
    pub fn validate(&self) -> Result<()> {
        if self.owner.as_deref() == Some(ANONYMOUS_OWNER) {
            return Err(IdentityError::config(
                "not logged into Replit, no identity present",
            ));
        }

        if self.identity.is_empty() {
            return Err(IdentityError::config(format!("no {ENV_IDENTITY} env var present")));
        }

        if self.identity_key.is_empty() {
            return Err(IdentityError::config(format!(
                "no {ENV_IDENTITY_KEY} env var present"
            )));
        }

        if self.replid.is_empty() {
            return Err(IdentityError::config(format!("no {ENV_REPL_ID} env var present")));
        }

        Ok(())
    }

    /// Root public keys from `REPL_PUBKEYS`
    pub fn public_keys(&self) -> Result<PublicKeyMap> {
        let json = self
            .public_keys
            .as_deref()
            .ok_or_else(|| IdentityError::config(format!("no {ENV_PUBKEYS} env var present")))?;
        PublicKeyMap::from_json(json)
    }

    /// Build a signing authority for this repl, checking certificates against the system clock
    pub fn signing_authority(&self) -> Result<SigningAuthority> {
        self.signing_authority_with_clock(&SystemClock)
    }

    pub fn signing_authority_with_clock(&self, clock: &dyn Clock) -> Result<SigningAuthority> {
        self.validate()?;
        let keys = self.public_keys()?;
        SigningAuthority::new_with_clock(
            &self.identity_key,
            &self.identity,
            &self.replid,
            keys,
            clock,
        )
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("identity", &"[REDACTED]")
            .field("identity_key", &"[REDACTED]")
            .field("replid", &self.replid)
            .field("owner", &self.owner)
            .field("public_keys", &self.public_keys)
            .finish()
    }
}

/// Key source reading `REPL_PUBKEYS` on every lookup
///
/// Usable directly wherever a [`PubKeySource`] is expected.
pub fn read_public_key_from_env(key_id: &str, issuer: &str) -> Option<VerifyingKey> {
    let json = std::env::var(ENV_PUBKEYS).ok()?;
    PublicKeyMap::from_json(&json).ok()?.public_key(key_id, issuer)
}

/// Signing authority for the current repl, built from the process environment
///
/// Creating an authority verifies the repl's whole certificate chain, so reuse
/// it when signing more than one token.
pub fn create_identity_token_signing_authority() -> Result<SigningAuthority> {
    IdentityConfig::from_env().signing_authority()
}

/// Mint a token proving the current repl's identity to `audience`
pub fn create_identity_token_addressed_to(audience: &str) -> Result<String> {
    Ok(create_identity_token_signing_authority()?.sign(audience))
}
