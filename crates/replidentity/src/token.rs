//! PASETO v2.public token primitive
//!
//! Tokens are `v2.public.<base64url(message || signature)>[.<base64url(footer)>]`
//! with an Ed25519 signature over the pre-authentication encoding of
//! header, message and footer. Identity tokens carry a base64url-encoded wire
//! message as the token message and a base64url-encoded
//! [`GovalSigningAuthority`] as the footer.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::{DecodeError, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SIGNATURE_LENGTH};
use replidentity_proto::{GovalSigningAuthority, Message};

use crate::error::{IdentityError, Result};

/// Header of every token this crate signs or verifies
pub const V2_PUBLIC_HEADER: &str = "v2.public.";

/// Largest token accepted for verification, nested certificates included
pub const MAX_TOKEN_LEN: usize = 64 * 1024;

/// Decoder for message and footer text written by other issuers: padding optional,
/// non-canonical trailing bits allowed. Paired with [`normalize_alphabet`].
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Pre-authentication encoding: little-endian piece count, then each piece
/// prefixed by its little-endian length (top bit cleared).
fn pae(pieces: &[&[u8]]) -> Vec<u8> {
    let capacity = 8 + pieces.iter().map(|p| 8 + p.len()).sum::<usize>();
    let mut out = Vec::with_capacity(capacity);
    out.extend_from_slice(&le64(pieces.len()));
    for piece in pieces {
        out.extend_from_slice(&le64(piece.len()));
        out.extend_from_slice(piece);
    }
    out
}

fn le64(n: usize) -> [u8; 8] {
    ((n as u64) & (u64::MAX >> 1)).to_le_bytes()
}

/// Sign `message` with `footer` attached
pub fn sign(key: &SigningKey, message: &[u8], footer: &[u8]) -> String {
    let signature = key.sign(&pae(&[V2_PUBLIC_HEADER.as_bytes(), message, footer]));

    let mut body = Vec::with_capacity(message.len() + SIGNATURE_LENGTH);
    body.extend_from_slice(message);
    body.extend_from_slice(&signature.to_bytes());

    let mut token = format!("{V2_PUBLIC_HEADER}{}", URL_SAFE_NO_PAD.encode(body));
    if !footer.is_empty() {
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(footer));
    }
    token
}

/// The decoded pieces of a token, before any signature check
struct Parts {
    message: Vec<u8>,
    signature: Signature,
    footer: Vec<u8>,
}

fn split(token: &str) -> Result<Parts> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(IdentityError::malformed_token(format!(
            "token is {} bytes, limit is {MAX_TOKEN_LEN}",
            token.len()
        )));
    }

    let rest = token.strip_prefix(V2_PUBLIC_HEADER).ok_or_else(|| {
        IdentityError::malformed_token(format!("token does not start with {V2_PUBLIC_HEADER}"))
    })?;

    let mut segments = rest.split('.');
    let body = segments.next().unwrap_or_default();
    let footer = segments.next();
    if segments.next().is_some() {
        return Err(IdentityError::malformed_token("token has too many segments"));
    }

    let mut message = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|e| IdentityError::malformed_token(format!("token body is not base64url: {e}")))?;
    if message.len() < SIGNATURE_LENGTH {
        return Err(IdentityError::malformed_token("token body is shorter than a signature"));
    }
    let signature_bytes: [u8; SIGNATURE_LENGTH] = message
        .split_off(message.len() - SIGNATURE_LENGTH)
        .as_slice()
        .try_into()
        .map_err(|_| IdentityError::malformed_token("token signature has the wrong length"))?;

    let footer = match footer {
        Some("") => return Err(IdentityError::malformed_token("token footer is empty")),
        Some(footer) => URL_SAFE_NO_PAD.decode(footer).map_err(|e| {
            IdentityError::malformed_token(format!("token footer is not base64url: {e}"))
        })?,
        None => Vec::new(),
    };

    Ok(Parts {
        message,
        signature: Signature::from_bytes(&signature_bytes),
        footer,
    })
}

/// Verify a token's signature and return its message
pub fn verify(key: &VerifyingKey, token: &str) -> Result<Vec<u8>> {
    let parts = split(token)?;
    let signed = pae(&[V2_PUBLIC_HEADER.as_bytes(), &parts.message, &parts.footer]);
    key.verify(&signed, &parts.signature)
        .map_err(|_| IdentityError::SignatureInvalid)?;
    Ok(parts.message)
}

/// Read a token's footer without verifying anything
pub fn footer(token: &str) -> Result<Vec<u8>> {
    Ok(split(token)?.footer)
}

/// Encode a wire message as token message text: base64url of its serialization
pub fn encode_body<M: Message>(message: &M) -> String {
    URL_SAFE_NO_PAD.encode(message.encode_to_vec())
}

/// Map the standard base64 alphabet onto base64url
fn normalize_alphabet(text: &[u8]) -> Vec<u8> {
    text.iter()
        .map(|&b| match b {
            b'+' => b'-',
            b'/' => b'_',
            b => b,
        })
        .collect()
}

/// Decode base64 text carried inside a token
///
/// Accepts base64url or standard base64, padded or not, as other issuers emit both.
fn decode_text(text: &[u8]) -> std::result::Result<Vec<u8>, DecodeError> {
    LENIENT_URL_SAFE.decode(normalize_alphabet(text))
}

/// Decode token message or footer text such as [`encode_body`] produces
///
/// Any failure means the chain carries bytes its signer should never have
/// signed, so it is reported as [`IdentityError::MalformedChain`].
pub fn decode_body<M: Message + Default>(body: &[u8]) -> Result<M> {
    let raw = decode_text(body)
        .map_err(|e| IdentityError::malformed_chain(format!("body is not base64: {e}")))?;
    M::decode(raw.as_slice()).map_err(|e| IdentityError::malformed_chain(e.to_string()))
}

/// Sign a wire message on behalf of `authority`
pub fn sign_message<M: Message>(
    key: &SigningKey,
    authority: &GovalSigningAuthority,
    message: &M,
) -> String {
    sign(
        key,
        encode_body(message).as_bytes(),
        encode_body(authority).as_bytes(),
    )
}

/// Extract the signing authority descriptor from a token's footer
pub fn signing_authority(token: &str) -> Result<GovalSigningAuthority> {
    let footer = footer(token)?;
    if footer.is_empty() {
        return Err(IdentityError::malformed_token("token has no signing authority footer"));
    }
    decode_body(&footer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use replidentity_proto::TokenVersion;

    // Produced independently for key seed [42; 32], message "aGVsbG8", footer "Zm9vdGVy"
    const KNOWN_TOKEN: &str = "v2.public.YUdWc2JHOPr-s-vGGePB9yz0He1thiPqoH8IrwWe4Rnj8rnM5dW_LDqssDmyju8p4kJ1lhZ0RK8xEi6EzMrwDo4dpnAMJQs.Wm05dmRHVnk";

    fn key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    #[test]
    fn test_sign_matches_known_vector() {
        assert_eq!(sign(&key(), b"aGVsbG8", b"Zm9vdGVy"), KNOWN_TOKEN);
    }

    #[test]
    fn test_verify_known_vector() {
        let message = verify(&key().verifying_key(), KNOWN_TOKEN).unwrap();
        assert_eq!(message, b"aGVsbG8");
        assert_eq!(footer(KNOWN_TOKEN).unwrap(), b"Zm9vdGVy");
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let other = SigningKey::from_bytes(&[1u8; 32]).verifying_key();
        assert_matches!(verify(&other, KNOWN_TOKEN), Err(IdentityError::SignatureInvalid));
    }

    #[test]
    fn test_verify_rejects_swapped_footer() {
        let (head, _) = KNOWN_TOKEN.rsplit_once('.').unwrap();
        let forged = format!("{head}.{}", URL_SAFE_NO_PAD.encode(b"other"));
        assert_matches!(
            verify(&key().verifying_key(), &forged),
            Err(IdentityError::SignatureInvalid)
        );
    }

    #[test]
    fn test_token_without_footer() {
        let token = sign(&key(), b"payload", b"");
        assert_eq!(token.matches('.').count(), 2);
        assert_eq!(verify(&key().verifying_key(), &token).unwrap(), b"payload");
        assert_matches!(
            signing_authority(&token),
            Err(IdentityError::MalformedToken { .. })
        );
    }

    #[test]
    fn test_structural_errors() {
        let public = key().verifying_key();
        assert_matches!(
            verify(&public, "v4.public.abc"),
            Err(IdentityError::MalformedToken { .. })
        );
        assert_matches!(
            verify(&public, "v2.public.AAAA"),
            Err(IdentityError::MalformedToken { .. })
        );
        assert_matches!(
            verify(&public, "v2.public.a.b.c"),
            Err(IdentityError::MalformedToken { .. })
        );

        let oversized = format!("{V2_PUBLIC_HEADER}{}", "A".repeat(MAX_TOKEN_LEN));
        assert_matches!(
            verify(&public, &oversized),
            Err(IdentityError::MalformedToken { .. })
        );
    }

    #[test]
    fn test_trailing_dot_is_rejected() {
        let public = key().verifying_key();
        let token = sign(&key(), b"payload", b"");
        assert!(verify(&public, &token).is_ok());

        assert_matches!(
            verify(&public, &format!("{token}.")),
            Err(IdentityError::MalformedToken { .. })
        );
    }

    #[test]
    fn test_decode_text_accepts_standard_and_padded() {
        assert_eq!(decode_text(b"__8").unwrap(), [0xff, 0xff]);
        assert_eq!(decode_text(b"__8=").unwrap(), [0xff, 0xff]);
        assert_eq!(decode_text(b"//8=").unwrap(), [0xff, 0xff]);
        assert_eq!(decode_text(b"+-8").unwrap(), [0xfb, 0xef]);
    }

    #[test]
    fn test_decode_body_accepts_padded_standard_base64() {
        use base64::engine::general_purpose::STANDARD;

        // 16 encoded bytes, so the text ends in padding
        let authority =
            GovalSigningAuthority::key_id("root", "conman", TokenVersion::TypeAwareToken);
        let text = STANDARD.encode(authority.encode_to_vec());
        assert!(text.ends_with('='));

        let decoded: GovalSigningAuthority = decode_body(text.as_bytes()).unwrap();
        assert_eq!(decoded, authority);
    }

    #[test]
    fn test_signing_authority_round_trips_through_footer() {
        let authority =
            GovalSigningAuthority::key_id("root", "conmanv1", TokenVersion::TypeAwareToken);
        let token = sign_message(&key(), &authority, &authority);

        assert_eq!(signing_authority(&token).unwrap(), authority);
    }

    #[test]
    fn test_decode_body_reports_malformed_chain() {
        assert_matches!(
            decode_body::<GovalSigningAuthority>(b"!!not base64!!"),
            Err(IdentityError::MalformedChain { .. })
        );
        // Valid base64url, but a truncated varint
        assert_matches!(
            decode_body::<GovalSigningAuthority>(b"GP8"),
            Err(IdentityError::MalformedChain { .. })
        );
    }
}
