//! Identity token verification
//!
//! An identity token is accepted when its chain verifies, it is a type-aware
//! token, it is addressed to the verifying repl, its identity stays inside the
//! signing certificate's scope, and every caller-supplied check passes.

use std::fmt;
use std::sync::Arc;

use replidentity_proto::{GovalReplIdentity, TokenVersion};

use crate::chain::{ChainVerifier, VerifiedChain};
use crate::clock::{Clock, SystemClock};
use crate::error::{IdentityError, Result};
use crate::keys::PubKeySource;
use crate::token;

/// Extra check run on a verified identity, in order, after the built-in checks
pub struct VerifyOption {
    check: Box<dyn Fn(&GovalReplIdentity) -> Result<()> + Send + Sync>,
}

impl VerifyOption {
    fn run(&self, identity: &GovalReplIdentity) -> Result<()> {
        (self.check)(identity)
    }
}

impl fmt::Debug for VerifyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOption").finish_non_exhaustive()
    }
}

/// Wrap an arbitrary predicate as a [`VerifyOption`]
///
/// Predicates typically fail with [`IdentityError::rejected`].
pub fn with_verify<F>(check: F) -> VerifyOption
where
    F: Fn(&GovalReplIdentity) -> Result<()> + Send + Sync + 'static,
{
    VerifyOption {
        check: Box::new(check),
    }
}

/// Require a forwarded identity to originate from `source_replid`
///
/// Identities with no origin replid were never forwarded and always pass.
pub fn with_source(source_replid: impl Into<String>) -> VerifyOption {
    let source_replid = source_replid.into();
    with_verify(move |identity| check_origin(identity, &source_replid))
}

fn check_origin(identity: &GovalReplIdentity, source_replid: &str) -> Result<()> {
    if !identity.origin_replid.is_empty() && identity.origin_replid != source_replid {
        return Err(IdentityError::OriginMismatch {
            expected: source_replid.to_string(),
            actual: identity.origin_replid.clone(),
        });
    }
    Ok(())
}

/// Decode the identity carried by a verified chain, rejecting bare tokens
pub(crate) fn identity_from_chain(chain: &VerifiedChain) -> Result<GovalReplIdentity> {
    match chain.authority.token_version() {
        Some(TokenVersion::TypeAwareToken) => token::decode_body(&chain.body),
        _ => Err(IdentityError::WrongTokenType),
    }
}

/// Verifies identity tokens against a set of root keys
///
/// # Example
///
/// ```no_run
/// use replidentity::{IdentityVerifier, PublicKeyMap};
///
/// # fn run(token: &str, keys: PublicKeyMap) -> replidentity::Result<()> {
/// let verifier = IdentityVerifier::new(keys);
/// let identity = verifier.verify(token, "my-repl-id", &[])?;
/// println!("request from {} ({})", identity.user, identity.replid);
/// # Ok(())
/// # }
/// ```
pub struct IdentityVerifier<K> {
    keys: K,
    clock: Arc<dyn Clock>,
}

impl<K: PubKeySource> IdentityVerifier<K> {
    /// Verifier using the system clock
    pub fn new(keys: K) -> Self {
        Self {
            keys,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for certificate validity checks
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Verify `token` and return the identity it carries
    ///
    /// `audience` is the replid of the verifying repl. `options` run in order
    /// and the first failure is returned.
    pub fn verify(
        &self,
        token: &str,
        audience: &str,
        options: &[VerifyOption],
    ) -> Result<GovalReplIdentity> {
        let chain = ChainVerifier::new(&self.keys, self.clock.as_ref()).verify_chain(token)?;
        let identity = identity_from_chain(&chain)?;

        if identity.aud != audience {
            return Err(IdentityError::AudienceMismatch {
                expected: audience.to_string(),
                actual: identity.aud,
            });
        }

        chain.state.check_claims_against_token(&identity)?;

        for option in options {
            option.run(&identity)?;
        }

        tracing::debug!(
            replid = %identity.replid,
            user = %identity.user,
            audience = %audience,
            "Identity verified"
        );

        Ok(identity)
    }

    /// [`IdentityVerifier::verify`], then reject identities forwarded from anyone
    /// but `source_replid`
    pub fn verify_with_source(
        &self,
        token: &str,
        audience: &str,
        source_replid: &str,
    ) -> Result<GovalReplIdentity> {
        let identity = self.verify(token, audience, &[])?;
        check_origin(&identity, source_replid)?;
        Ok(identity)
    }
}

impl<K: fmt::Debug> fmt::Debug for IdentityVerifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Verify an identity token using the system clock
pub fn verify_identity(
    token: &str,
    audience: &str,
    keys: impl PubKeySource,
    options: &[VerifyOption],
) -> Result<GovalReplIdentity> {
    IdentityVerifier::new(keys).verify(token, audience, options)
}

/// Verify an identity token and its origin using the system clock
pub fn verify_identity_with_source(
    token: &str,
    audience: &str,
    source_replid: &str,
    keys: impl PubKeySource,
) -> Result<GovalReplIdentity> {
    IdentityVerifier::new(keys).verify_with_source(token, audience, source_replid)
}
