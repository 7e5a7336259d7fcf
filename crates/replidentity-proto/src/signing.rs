//! Signing schema messages

/// Format of the body carried by an identity token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TokenVersion {
    /// Legacy token whose body is not tagged with its type. Rejected by identity verification.
    BareReplToken = 0,
    /// Token whose body is a serialized [`GovalReplIdentity`].
    TypeAwareToken = 1,
}

/// Capability flags a certificate may grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FlagClaim {
    /// Allows minting goval tokens.
    MintGovalToken = 0,
    /// Allows signing further intermediate certificates.
    SignIntermediateCert = 1,
    /// Allows signing identity tokens.
    Identity = 5,
    /// Ghostwriter access.
    Ghostwriter = 6,
    /// Allows renewing identity tokens.
    RenewIdentity = 7,
    /// Allows renewing KV tokens.
    RenewKv = 8,
    /// Deployment access.
    Deployments = 9,
    /// Authorizes any repl ID.
    AnyReplid = 10,
    /// Authorizes any user.
    AnyUser = 11,
    /// Authorizes any cluster.
    AnyCluster = 12,
}

impl FlagClaim {
    /// Schema name of the flag.
    pub fn name(&self) -> &'static str {
        match self {
            FlagClaim::MintGovalToken => "MINT_GOVAL_TOKEN",
            FlagClaim::SignIntermediateCert => "SIGN_INTERMEDIATE_CERT",
            FlagClaim::Identity => "IDENTITY",
            FlagClaim::Ghostwriter => "GHOSTWRITER",
            FlagClaim::RenewIdentity => "RENEW_IDENTITY",
            FlagClaim::RenewKv => "RENEW_KV",
            FlagClaim::Deployments => "DEPLOYMENTS",
            FlagClaim::AnyReplid => "ANY_REPLID",
            FlagClaim::AnyUser => "ANY_USER",
            FlagClaim::AnyCluster => "ANY_CLUSTER",
        }
    }
}

/// Seconds/nanos since the Unix epoch, wire compatible with `google.protobuf.Timestamp`.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

impl Timestamp {
    /// Timestamp at whole seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }
}

/// Identifies who signed a token. Carried base64url-encoded in the token footer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GovalSigningAuthority {
    #[prost(oneof = "goval_signing_authority::Cert", tags = "1, 2")]
    pub cert: Option<goval_signing_authority::Cert>,
    #[prost(enumeration = "TokenVersion", tag = "3")]
    pub version: i32,
    #[prost(string, tag = "4")]
    pub issuer: String,
}

/// Nested types for [`GovalSigningAuthority`].
pub mod goval_signing_authority {
    /// The signer: a root key looked up by ID, or a certificate wrapped as a token.
    #[derive(Clone, PartialEq, Eq, ::prost::Oneof)]
    pub enum Cert {
        #[prost(string, tag = "1")]
        KeyId(String),
        #[prost(string, tag = "2")]
        SignedCert(String),
    }
}

impl GovalSigningAuthority {
    /// Authority resolved through the key source.
    pub fn key_id(
        key_id: impl Into<String>,
        issuer: impl Into<String>,
        version: TokenVersion,
    ) -> Self {
        Self {
            cert: Some(goval_signing_authority::Cert::KeyId(key_id.into())),
            version: version.into(),
            issuer: issuer.into(),
        }
    }

    /// Authority backed by a signed certificate token.
    pub fn signed_cert(cert_token: impl Into<String>, version: TokenVersion) -> Self {
        Self {
            cert: Some(goval_signing_authority::Cert::SignedCert(cert_token.into())),
            version: version.into(),
            issuer: String::new(),
        }
    }

    /// Declared token version, `None` for values outside the schema.
    pub fn token_version(&self) -> Option<TokenVersion> {
        TokenVersion::try_from(self.version).ok()
    }
}

/// A single grant within a certificate.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CertificateClaim {
    #[prost(oneof = "certificate_claim::Claim", tags = "1, 2, 3, 4")]
    pub claim: Option<certificate_claim::Claim>,
}

/// Nested types for [`CertificateClaim`].
pub mod certificate_claim {
    #[derive(Clone, PartialEq, Eq, ::prost::Oneof)]
    pub enum Claim {
        #[prost(string, tag = "1")]
        Replid(String),
        #[prost(string, tag = "2")]
        User(String),
        #[prost(enumeration = "super::FlagClaim", tag = "3")]
        Flag(i32),
        #[prost(string, tag = "4")]
        Cluster(String),
    }
}

impl CertificateClaim {
    pub fn replid(replid: impl Into<String>) -> Self {
        Self {
            claim: Some(certificate_claim::Claim::Replid(replid.into())),
        }
    }

    pub fn user(user: impl Into<String>) -> Self {
        Self {
            claim: Some(certificate_claim::Claim::User(user.into())),
        }
    }

    pub fn cluster(cluster: impl Into<String>) -> Self {
        Self {
            claim: Some(certificate_claim::Claim::Cluster(cluster.into())),
        }
    }

    pub fn flag(flag: FlagClaim) -> Self {
        Self {
            claim: Some(certificate_claim::Claim::Flag(flag.into())),
        }
    }
}

/// Binds a public key to a set of claims for a validity window.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GovalCert {
    #[prost(message, optional, tag = "1")]
    pub iat: Option<Timestamp>,
    #[prost(message, optional, tag = "2")]
    pub exp: Option<Timestamp>,
    #[prost(message, repeated, tag = "3")]
    pub claims: Vec<CertificateClaim>,
    /// PASERK public key (`k2.public.`) or a PEM encoded X.509 certificate.
    #[prost(string, tag = "4")]
    pub public_key: String,
}

/// The identity a repl proves to another repl.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct GovalReplIdentity {
    #[prost(string, tag = "1")]
    pub replid: String,
    #[prost(string, tag = "2")]
    pub user: String,
    #[prost(string, tag = "3")]
    pub slug: String,
    /// Repl ID of the intended recipient.
    #[prost(string, tag = "4")]
    pub aud: String,
    #[prost(bool, tag = "5")]
    pub ephemeral: bool,
    /// Repl that originally established this identity, empty unless forwarded.
    #[prost(string, tag = "6")]
    pub origin_replid: String,
}
