//! Certificate chain verification
//!
//! A token's footer names its signer. A root signer is a key ID resolved
//! through the caller's [`PubKeySource`]; any other signer is a certificate
//! that is itself a token, verified the same way. The walk recurses from the
//! presented token out to the root and then checks each certificate on the way
//! back in:
//!
//! 1. the certificate is inside its validity window,
//! 2. its own signer (if not the root key) holds `SIGN_INTERMEDIATE_CERT`,
//! 3. every scoped claim it makes is held by its signer or covered by an ANY_* flag,
//! 4. the token it signed carries a valid signature from its public key.
//!
//! The claims of the innermost certificate are returned as a [`ChainState`]
//! alongside the verified body; they bound what the final token may assert.

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use replidentity_paserk::{
    paserk_public_to_public_key, pem_to_public_key, PASERK_PUBLIC_HEADER,
};
use replidentity_proto::goval_signing_authority::Cert;
use replidentity_proto::{
    FlagClaim, GovalCert, GovalReplIdentity, GovalSigningAuthority, Timestamp,
};

use crate::claims::{check_expiry, check_scope, Claim, ClaimsSet, ScopeOverrides};
use crate::clock::Clock;
use crate::error::{AuthzError, IdentityError, Result};
use crate::keys::PubKeySource;
use crate::token;

/// Most nested certificates accepted above the presented token
pub const MAX_CHAIN_DEPTH: usize = 5;

/// Claims established by the innermost verified certificate
///
/// `claims` is `None` when the token was signed directly by a root key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainState {
    claims: Option<ClaimsSet>,
    overrides: ScopeOverrides,
}

impl ChainState {
    /// State of a token signed by a root key: implicitly authorized for everything
    pub fn root() -> Self {
        Self::default()
    }

    fn from_cert(cert: &GovalCert) -> Self {
        let claims = ClaimsSet::from_claims(&cert.claims);
        let overrides = claims.overrides();
        Self {
            claims: Some(claims),
            overrides,
        }
    }

    pub fn claims(&self) -> Option<&ClaimsSet> {
        self.claims.as_ref()
    }

    pub fn overrides(&self) -> ScopeOverrides {
        self.overrides
    }

    /// Ensure the final identity stays within the signing certificate's scope
    ///
    /// This is what stops a holder of a forwarding-protection key from minting
    /// identities for other repls or users. Cluster is not part of an identity
    /// and is never checked here.
    pub fn check_claims_against_token(
        &self,
        identity: &GovalReplIdentity,
    ) -> std::result::Result<(), AuthzError> {
        check_scope(
            self.claims.as_ref(),
            &identity.replid,
            &identity.user,
            "",
            self.overrides,
        )
    }
}

/// Output of a successful chain walk
#[derive(Debug, Clone)]
pub struct VerifiedChain {
    /// Verified message of the presented token (base64url text of a wire message)
    pub body: Vec<u8>,
    /// Signing authority descriptor from the presented token's footer
    pub authority: GovalSigningAuthority,
    /// Certificate that signed the presented token, `None` for a root key
    pub cert: Option<GovalCert>,
    /// Claims the presented token is bound by
    pub state: ChainState,
}

/// Walks one token's signing chain
///
/// Holds no mutable state; each call to [`ChainVerifier::verify_chain`] is independent.
pub struct ChainVerifier<'a> {
    keys: &'a dyn PubKeySource,
    clock: &'a dyn Clock,
}

impl<'a> ChainVerifier<'a> {
    pub fn new(keys: &'a dyn PubKeySource, clock: &'a dyn Clock) -> Self {
        Self { keys, clock }
    }

    /// Verify `token` and every certificate above it
    pub fn verify_chain(&self, token: &str) -> Result<VerifiedChain> {
        self.walk(token, 0)
    }

    fn walk(&self, token: &str, depth: usize) -> Result<VerifiedChain> {
        if depth > MAX_CHAIN_DEPTH {
            return Err(IdentityError::ChainTooDeep {
                max: MAX_CHAIN_DEPTH,
            });
        }

        let authority = token::signing_authority(token)?;

        match &authority.cert {
            Some(Cert::KeyId(key_id)) => {
                let key = self
                    .keys
                    .public_key(key_id, &authority.issuer)
                    .ok_or_else(|| IdentityError::UnknownKey {
                        key_id: key_id.clone(),
                        issuer: authority.issuer.clone(),
                    })?;
                let body = token::verify(&key, token)?;

                tracing::debug!(
                    depth,
                    key_id = %key_id,
                    issuer = %authority.issuer,
                    "Token verified against root key"
                );

                Ok(VerifiedChain {
                    body,
                    authority,
                    cert: None,
                    state: ChainState::root(),
                })
            }
            Some(Cert::SignedCert(parent_token)) => {
                let parent = self.walk(parent_token, depth + 1)?;
                let signing_cert: GovalCert = token::decode_body(&parent.body)?;
                let state = self.verify_cert(&signing_cert, parent.cert.as_ref())?;

                let key = cert_public_key(&signing_cert)?;
                let body = token::verify(&key, token)?;

                tracing::debug!(
                    depth,
                    claims = signing_cert.claims.len(),
                    "Token verified against signing certificate"
                );

                Ok(VerifiedChain {
                    body,
                    authority,
                    cert: Some(signing_cert),
                    state,
                })
            }
            None => Err(IdentityError::malformed_chain(
                "signing authority names neither a key nor a certificate",
            )),
        }
    }

    /// Validate `cert` against the certificate that signed it (`None` for a root key)
    fn verify_cert(&self, cert: &GovalCert, signer: Option<&GovalCert>) -> Result<ChainState> {
        let issued_at = cert_time(cert.iat.as_ref(), "iat")?;
        let expires_at = cert_time(cert.exp.as_ref(), "exp")?;
        check_expiry(issued_at, expires_at, self.clock.now())?;

        if let Some(signer) = signer {
            let authorized = ClaimsSet::from_claims(&signer.claims);
            if !authorized.has_flag(FlagClaim::SignIntermediateCert) {
                return Err(AuthzError::NotAuthorizedToSignIntermediate.into());
            }

            for claim in cert.claims.iter().filter_map(Claim::from_wire) {
                if !authorized.permits(&claim) {
                    return Err(AuthzError::ClaimNotAuthorized {
                        claim: claim.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(ChainState::from_cert(cert))
    }
}

/// Verify a token's chain with a fresh verifier
pub fn verify_chain(
    token: &str,
    keys: &dyn PubKeySource,
    clock: &dyn Clock,
) -> Result<VerifiedChain> {
    ChainVerifier::new(keys, clock).verify_chain(token)
}

/// Public key a certificate binds: PASERK when prefixed, otherwise a PEM X.509 certificate
pub fn cert_public_key(cert: &GovalCert) -> Result<VerifyingKey> {
    let key = if cert.public_key.starts_with(PASERK_PUBLIC_HEADER) {
        paserk_public_to_public_key(&cert.public_key)?
    } else {
        pem_to_public_key(&cert.public_key)?
    };
    Ok(key)
}

fn cert_time(ts: Option<&Timestamp>, field: &str) -> Result<DateTime<Utc>> {
    let ts =
        ts.ok_or_else(|| IdentityError::malformed_chain(format!("certificate has no {field}")))?;
    u32::try_from(ts.nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(ts.seconds, nanos))
        .ok_or_else(|| {
            IdentityError::malformed_chain(format!("certificate {field} is out of range"))
        })
}
