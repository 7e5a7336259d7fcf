//! Certificate claims and scope checks
//!
//! A certificate grants a set of repl IDs, users, clusters and capability flags.
//! The absence of a claims set (`None`) is how the root key is represented: a
//! token signed directly by a root key is implicitly authorized for everything.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use replidentity_proto::certificate_claim::Claim as WireClaim;
use replidentity_proto::{CertificateClaim, FlagClaim, GovalCert};

use crate::error::{AuthzError, TimeError};

/// Which part of a requested scope failed authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeField {
    Replid,
    User,
    Cluster,
}

impl fmt::Display for ScopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScopeField::Replid => "replid",
            ScopeField::User => "user",
            ScopeField::Cluster => "cluster",
        })
    }
}

/// One unit of granted scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Claim {
    Replid(String),
    User(String),
    Cluster(String),
    Flag(FlagClaim),
}

impl Claim {
    /// Convert a wire claim. Empty claims and flags outside the schema yield `None`.
    pub fn from_wire(claim: &CertificateClaim) -> Option<Self> {
        match claim.claim.as_ref()? {
            WireClaim::Replid(replid) => Some(Claim::Replid(replid.clone())),
            WireClaim::User(user) => Some(Claim::User(user.clone())),
            WireClaim::Cluster(cluster) => Some(Claim::Cluster(cluster.clone())),
            WireClaim::Flag(flag) => match FlagClaim::try_from(*flag) {
                Ok(flag) => Some(Claim::Flag(flag)),
                Err(_) => {
                    tracing::debug!(flag = *flag, "Ignoring unknown flag claim");
                    None
                }
            },
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Claim::Replid(replid) => write!(f, "replid:{replid}"),
            Claim::User(user) => write!(f, "user:{user}"),
            Claim::Cluster(cluster) => write!(f, "cluster:{cluster}"),
            Claim::Flag(flag) => write!(f, "flag:{}", flag.name()),
        }
    }
}

/// Flags that waive a scope check for one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeOverrides {
    pub any_replid: bool,
    pub any_user: bool,
    pub any_cluster: bool,
}

/// Indexed claims of a single certificate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsSet {
    repls: HashSet<String>,
    users: HashSet<String>,
    clusters: HashSet<String>,
    flags: HashSet<FlagClaim>,
}

impl ClaimsSet {
    /// Index a sequence of wire claims
    pub fn from_claims<'a>(claims: impl IntoIterator<Item = &'a CertificateClaim>) -> Self {
        let mut set = Self::default();
        for claim in claims.into_iter().filter_map(Claim::from_wire) {
            set.insert(claim);
        }
        set
    }

    pub fn insert(&mut self, claim: Claim) {
        match claim {
            Claim::Replid(replid) => {
                self.repls.insert(replid);
            }
            Claim::User(user) => {
                self.users.insert(user);
            }
            Claim::Cluster(cluster) => {
                self.clusters.insert(cluster);
            }
            Claim::Flag(flag) => {
                self.flags.insert(flag);
            }
        }
    }

    pub fn has_replid(&self, replid: &str) -> bool {
        self.repls.contains(replid)
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.users.contains(user)
    }

    pub fn has_cluster(&self, cluster: &str) -> bool {
        self.clusters.contains(cluster)
    }

    pub fn has_flag(&self, flag: FlagClaim) -> bool {
        self.flags.contains(&flag)
    }

    /// ANY_* overrides granted anywhere in this set
    pub fn overrides(&self) -> ScopeOverrides {
        ScopeOverrides {
            any_replid: self.has_flag(FlagClaim::AnyReplid),
            any_user: self.has_flag(FlagClaim::AnyUser),
            any_cluster: self.has_flag(FlagClaim::AnyCluster),
        }
    }

    /// Whether a certificate holding this set may grant `claim` to a certificate it signs
    ///
    /// Flags always propagate; scoped claims must be held or covered by an ANY_* flag.
    pub fn permits(&self, claim: &Claim) -> bool {
        let overrides = self.overrides();
        match claim {
            Claim::Replid(replid) => overrides.any_replid || self.has_replid(replid),
            Claim::User(user) => overrides.any_user || self.has_user(user),
            Claim::Cluster(cluster) => overrides.any_cluster || self.has_cluster(cluster),
            Claim::Flag(_) => true,
        }
    }
}

/// Build the claims set of a certificate; `None` stands for the root key
pub fn build_claims_set(cert: Option<&GovalCert>) -> Option<ClaimsSet> {
    cert.map(|cert| ClaimsSet::from_claims(&cert.claims))
}

/// Check a requested scope against a claims set
///
/// Empty values are not checked. `None` claims always succeed.
pub fn check_scope(
    claims: Option<&ClaimsSet>,
    replid: &str,
    user: &str,
    cluster: &str,
    overrides: ScopeOverrides,
) -> Result<(), AuthzError> {
    let Some(claims) = claims else {
        return Ok(());
    };

    if !replid.is_empty() && !overrides.any_replid && !claims.has_replid(replid) {
        return Err(AuthzError::Unauthorized(ScopeField::Replid));
    }

    if !user.is_empty() && !overrides.any_user && !claims.has_user(user) {
        return Err(AuthzError::Unauthorized(ScopeField::User));
    }

    if !cluster.is_empty() && !overrides.any_cluster && !claims.has_cluster(cluster) {
        return Err(AuthzError::Unauthorized(ScopeField::Cluster));
    }

    Ok(())
}

/// Check that `now` falls inside `[issued_at, expires_at]`
pub fn check_expiry(
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TimeError> {
    if now < issued_at {
        return Err(TimeError::NotYetValid { issued_at, now });
    }

    if now > expires_at {
        return Err(TimeError::Expired { expires_at, now });
    }

    Ok(())
}
