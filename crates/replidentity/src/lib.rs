//! Repl Identity
//!
//! Proof of which repl (and which user) is on the other end of a request.
//!
//! Every repl receives an identity token addressed to itself and the private key
//! of the certificate that signed it. With those it mints tokens addressed to
//! other repls ([`SigningAuthority`]); the recipient checks them with
//! [`verify_identity`]:
//! - "This token was signed through a certificate chain ending at a trusted root key"
//! - "Every certificate in the chain only granted scope its signer held"
//! - "The token is addressed to me and names a repl its certificate covers"
//!
//! Verification is a pure decision: no retries, no partial success. The process
//! environment is only read by the helpers in [`config`].

#![allow(missing_docs)]

pub mod chain;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod sign;
pub mod token;
pub mod verify;

// Re-export commonly used types
pub use chain::{verify_chain, ChainState, ChainVerifier, VerifiedChain, MAX_CHAIN_DEPTH};
pub use claims::{
    build_claims_set, check_expiry, check_scope, Claim, ClaimsSet, ScopeField, ScopeOverrides,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AuthzError, IdentityError, Result, TimeError};
pub use keys::{PubKeySource, PublicKeyMap};
pub use sign::{sign_identity, SigningAuthority};
pub use verify::{
    verify_identity, verify_identity_with_source, with_source, with_verify, IdentityVerifier,
    VerifyOption,
};

// Environment helpers
pub use config::{
    create_identity_token_addressed_to, create_identity_token_signing_authority,
    read_public_key_from_env, IdentityConfig,
};

// Wire schema and key codec
pub use replidentity_paserk as paserk;
pub use replidentity_proto as proto;
pub use replidentity_proto::{GovalReplIdentity, GovalSigningAuthority};
