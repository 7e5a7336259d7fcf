//! Minting identity tokens on behalf of the current repl
//!
//! A repl is handed its own identity token (addressed to itself) and the
//! private key of the certificate that signed it. From those it can mint tokens
//! addressed to any other repl, reusing its certificate chain as the footer.
//! The origin replid is carried over unchanged, so a recipient that re-signs a
//! forwarded identity cannot hide where it came from.

use std::fmt;

use ed25519_dalek::SigningKey;
use replidentity_paserk::{gsaid, paserk_secret_to_private_key};
use replidentity_proto::{GovalReplIdentity, GovalSigningAuthority};

use crate::chain::ChainVerifier;
use crate::clock::{Clock, SystemClock};
use crate::error::{IdentityError, Result};
use crate::keys::PubKeySource;
use crate::token;
use crate::verify::identity_from_chain;

/// Sign `identity` with `private_key`, naming `authority` as the signer
pub fn sign_identity(
    private_key: &SigningKey,
    authority: &GovalSigningAuthority,
    identity: &GovalReplIdentity,
) -> String {
    token::sign_message(private_key, authority, identity)
}

/// Signs identity tokens as the current repl
pub struct SigningAuthority {
    private_key: SigningKey,
    signing_authority: GovalSigningAuthority,
    identity: GovalReplIdentity,
}

impl SigningAuthority {
    /// Build a signing authority from the repl's own credentials
    ///
    /// `raw_private_key` is a `k2.secret.` PASERK (`REPL_IDENTITY_KEY`),
    /// `raw_identity` the repl's identity token (`REPL_IDENTITY`) and `replid`
    /// the repl's own ID (`REPL_ID`). The identity token must verify through
    /// `keys`, be type-aware, and be issued to and addressed to `replid`.
    pub fn new(
        raw_private_key: &str,
        raw_identity: &str,
        replid: &str,
        keys: impl PubKeySource,
    ) -> Result<Self> {
        Self::new_with_clock(raw_private_key, raw_identity, replid, keys, &SystemClock)
    }

    /// [`SigningAuthority::new`] with an explicit clock for certificate validity
    pub fn new_with_clock(
        raw_private_key: &str,
        raw_identity: &str,
        replid: &str,
        keys: impl PubKeySource,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let chain = ChainVerifier::new(&keys, clock).verify_chain(raw_identity)?;
        let private_key = paserk_secret_to_private_key(raw_private_key)?;
        let identity = identity_from_chain(&chain)?;

        chain.state.check_claims_against_token(&identity)?;

        if identity.replid != replid {
            return Err(IdentityError::SelfReplidMismatch {
                expected: replid.to_string(),
                actual: identity.replid,
            });
        }

        if identity.aud != replid {
            return Err(IdentityError::SelfAudienceMismatch {
                expected: replid.to_string(),
                actual: identity.aud,
            });
        }

        let authority = Self {
            private_key,
            signing_authority: chain.authority,
            identity,
        };

        tracing::debug!(
            replid = %authority.identity.replid,
            authority_id = %authority.id(),
            "Signing authority initialized"
        );

        Ok(authority)
    }

    /// Mint a token proving this repl's identity to `audience`
    pub fn sign(&self, audience: &str) -> String {
        let identity = GovalReplIdentity {
            replid: self.identity.replid.clone(),
            user: self.identity.user.clone(),
            slug: self.identity.slug.clone(),
            aud: audience.to_string(),
            origin_replid: self.identity.origin_replid.clone(),
            ..Default::default()
        };

        tracing::debug!(
            replid = %identity.replid,
            audience = %audience,
            "Signing identity token"
        );

        sign_identity(&self.private_key, &self.signing_authority, &identity)
    }

    /// Verified identity of this repl
    pub fn identity(&self) -> &GovalReplIdentity {
        &self.identity
    }

    /// Descriptor attached as the footer of every minted token
    pub fn signing_authority(&self) -> &GovalSigningAuthority {
        &self.signing_authority
    }

    /// `k2.gsaid.` identifier of the signing authority descriptor
    pub fn id(&self) -> String {
        gsaid(&self.signing_authority)
    }
}

impl fmt::Debug for SigningAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningAuthority")
            .field("private_key", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
