//! Deterministic certificate chains for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use replidentity::paserk::{private_key_to_paserk_secret, public_key_to_paserk_public};
use replidentity::proto::{
    CertificateClaim, FlagClaim, GovalCert, GovalReplIdentity, GovalSigningAuthority, Timestamp,
    TokenVersion,
};
use replidentity::{token, FixedClock, PublicKeyMap};

pub const ROOT_KEY_ID: &str = "root-key";
pub const ISSUER: &str = "conmanv1";

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn clock() -> FixedClock {
    FixedClock(now())
}

pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn root_key() -> SigningKey {
    signing_key(1)
}

pub fn root_keys() -> PublicKeyMap {
    let mut keys = PublicKeyMap::new();
    keys.insert(ROOT_KEY_ID, root_key().verifying_key());
    keys
}

pub fn root_authority() -> GovalSigningAuthority {
    GovalSigningAuthority::key_id(ROOT_KEY_ID, ISSUER, TokenVersion::TypeAwareToken)
}

pub fn signed_by(cert_token: &str) -> GovalSigningAuthority {
    GovalSigningAuthority::signed_cert(cert_token, TokenVersion::TypeAwareToken)
}

/// Certificate for `key` valid for an hour either side of [`now`]
pub fn cert(key: &SigningKey, claims: Vec<CertificateClaim>) -> GovalCert {
    cert_window(key, claims, now() - Duration::hours(1), now() + Duration::hours(1))
}

pub fn cert_window(
    key: &SigningKey,
    claims: Vec<CertificateClaim>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> GovalCert {
    GovalCert {
        iat: Some(Timestamp::from_seconds(issued_at.timestamp())),
        exp: Some(Timestamp::from_seconds(expires_at.timestamp())),
        claims,
        public_key: public_key_to_paserk_public(&key.verifying_key()).to_string(),
    }
}

/// Claims of a certificate allowed to sign further certificates for anyone
pub fn intermediate_claims() -> Vec<CertificateClaim> {
    vec![
        CertificateClaim::flag(FlagClaim::SignIntermediateCert),
        CertificateClaim::flag(FlagClaim::AnyReplid),
        CertificateClaim::flag(FlagClaim::AnyUser),
        CertificateClaim::flag(FlagClaim::AnyCluster),
        CertificateClaim::flag(FlagClaim::Identity),
    ]
}

/// Claims of a repl certificate
pub fn repl_claims(replid: &str, user: &str) -> Vec<CertificateClaim> {
    vec![
        CertificateClaim::replid(replid),
        CertificateClaim::user(user),
        CertificateClaim::flag(FlagClaim::Identity),
    ]
}

pub fn identity(replid: &str, user: &str, aud: &str) -> GovalReplIdentity {
    GovalReplIdentity {
        replid: replid.to_string(),
        user: user.to_string(),
        slug: format!("{replid}-slug"),
        aud: aud.to_string(),
        ..Default::default()
    }
}

/// A repl certificate chained to the root key, plus the repl's private key
pub struct ReplChain {
    pub repl_key: SigningKey,
    pub repl_cert_token: String,
}

impl ReplChain {
    /// root key → repl certificate
    pub fn root_signed(replid: &str, user: &str) -> Self {
        let repl_key = signing_key(3);
        let repl_cert_token = token::sign_message(
            &root_key(),
            &root_authority(),
            &cert(&repl_key, repl_claims(replid, user)),
        );
        Self {
            repl_key,
            repl_cert_token,
        }
    }

    /// root key → intermediate certificate → repl certificate
    pub fn with_intermediate(replid: &str, user: &str) -> Self {
        let intermediate_key = signing_key(2);
        let intermediate_token = token::sign_message(
            &root_key(),
            &root_authority(),
            &cert(&intermediate_key, intermediate_claims()),
        );

        let repl_key = signing_key(3);
        let repl_cert_token = token::sign_message(
            &intermediate_key,
            &signed_by(&intermediate_token),
            &cert(&repl_key, repl_claims(replid, user)),
        );
        Self {
            repl_key,
            repl_cert_token,
        }
    }

    pub fn authority(&self) -> GovalSigningAuthority {
        signed_by(&self.repl_cert_token)
    }

    /// Sign any identity with the repl certificate's key
    pub fn mint(&self, identity: &GovalReplIdentity) -> String {
        token::sign_message(&self.repl_key, &self.authority(), identity)
    }

    pub fn repl_secret(&self) -> String {
        private_key_to_paserk_secret(&self.repl_key).as_str().to_string()
    }
}

/// `depth` certificates below the root key, each allowed to sign the next,
/// returning the last certificate's key and token
pub fn deep_chain(depth: usize) -> (SigningKey, String) {
    let mut signer = root_key();
    let mut authority = root_authority();
    let mut cert_token = String::new();

    for i in 0..depth {
        let key = signing_key(10 + i as u8);
        cert_token = token::sign_message(&signer, &authority, &cert(&key, intermediate_claims()));
        authority = signed_by(&cert_token);
        signer = key;
    }

    (signer, cert_token)
}
