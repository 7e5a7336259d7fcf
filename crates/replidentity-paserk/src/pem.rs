//! Ed25519 public keys embedded in PEM X.509 certificates

use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use x509_parser::oid_registry::OID_SIG_ED25519;
use x509_parser::pem::parse_x509_pem;

use crate::error::{PaserkError, Result};

/// Extract the Ed25519 public key from a PEM encoded X.509 certificate
///
/// Fails with [`PaserkError::UnsupportedKeyType`] when the certificate
/// carries any other key algorithm.
pub fn pem_to_public_key(pem: &str) -> Result<VerifyingKey> {
    let (_, pem) = parse_x509_pem(pem.as_bytes())
        .map_err(|e| PaserkError::format(format!("invalid PEM block: {e}")))?;
    let cert = pem
        .parse_x509()
        .map_err(|e| PaserkError::format(format!("invalid X.509 certificate: {e}")))?;

    let spki = cert.public_key();
    if spki.algorithm.algorithm != OID_SIG_ED25519 {
        return Err(PaserkError::unsupported_key_type(
            spki.algorithm.algorithm.to_id_string(),
        ));
    }

    let data: &[u8] = &spki.subject_public_key.data;
    let raw: [u8; PUBLIC_KEY_LENGTH] = data
        .try_into()
        .map_err(|_| PaserkError::invalid_key("ed25519 key in certificate has the wrong length"))?;

    VerifyingKey::from_bytes(&raw).map_err(|e| PaserkError::invalid_key(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ed25519_dalek::SigningKey;

    // Self-signed, key seed [42; 32]
    const ED25519_CERT: &str = "-----BEGIN CERTIFICATE-----
MIHYMIGLoAMCAQICAQEwBQYDK2VwMBUxEzARBgNVBAMMCmdvdmFsLXRlc3QwIBcN
MjAwMTAxMDAwMDAwWhgPMjEyMDAxMDEwMDAwMDBaMBUxEzARBgNVBAMMCmdvdmFs
LXRlc3QwKjAFBgMrZXADIQAZf2sj4WyFMsaryDj6zV6nib4MdrKSAzQDm/qLPTaN
YTAFBgMrZXADQQALTW5aCZysBgh32QNwY09mC1HOca3o0z3j3kFWecEcHy3Rt0et
Z7Z/HcoPMZAqPfA+KpDm2jpPQVNJLg3z8A8B
-----END CERTIFICATE-----
";

    const P256_CERT: &str = "-----BEGIN CERTIFICATE-----
MIIBGDCBv6ADAgECAgECMAoGCCqGSM49BAMCMBUxEzARBgNVBAMMCmdvdmFsLXRl
c3QwIBcNMjAwMTAxMDAwMDAwWhgPMjEyMDAxMDEwMDAwMDBaMBUxEzARBgNVBAMM
CmdvdmFsLXRlc3QwWTATBgcqhkjOPQIBBggqhkjOPQMBBwNCAAQm7869DunjSmaR
h+GLOpEisvczlFtknMn5+SHp+drYEpAji96cx7szDRUMZ3BN0lrnBVIFdEtvMb9A
cHRYctDmMAoGCCqGSM49BAMCA0gAMEUCIDKIfsT88xntyrttn9ci4aHJ/pgrakPw
gHe2wBkMAA3KAiEA34nFu0FcPvAzTHC7TTEVbOcePUWqkh2mvhWJFShN9zo=
-----END CERTIFICATE-----
";

    #[test]
    fn test_extracts_ed25519_key() {
        let key = pem_to_public_key(ED25519_CERT).unwrap();
        let expected = SigningKey::from_bytes(&[42u8; 32]).verifying_key();
        assert_eq!(key, expected);
    }

    #[test]
    fn test_rejects_non_ed25519_key() {
        let err = pem_to_public_key(P256_CERT).unwrap_err();
        assert_matches!(
            err,
            PaserkError::UnsupportedKeyType { ref algorithm } if algorithm == "1.2.840.10045.2.1"
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_matches!(
            pem_to_public_key("not a certificate"),
            Err(PaserkError::Format { .. })
        );
    }
}
