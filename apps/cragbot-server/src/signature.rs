//! Ed25519 request signature verification.
//!
//! Discord signs every interaction webhook over `timestamp || body` with the
//! application's private key. Verification must run on the exact bytes
//! received, before the body is parsed.

use ed25519_dalek::{PUBLIC_KEY_LENGTH, Signature, Verifier, VerifyingKey};

/// Returns `true` if `signature` is a valid Ed25519 signature of
/// `timestamp || raw_body` under `public_key`.
///
/// `signature` and `public_key` are hex strings. Malformed hex, wrong
/// lengths, or an invalid public key all yield `false`.
///
/// # Examples
///
/// ```
/// use cragbot_server::signature::verify;
///
/// assert!(!verify(b"{}", "not-hex", "1700000000", "also-not-hex"));
/// ```
pub fn verify(raw_body: &[u8], signature: &str, timestamp: &str, public_key: &str) -> bool {
    let Some(key) = parse_public_key(public_key) else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&signature_bytes) else {
        return false;
    };

    let mut message = Vec::with_capacity(timestamp.len() + raw_body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(raw_body);

    key.verify(&message, &signature).is_ok()
}

fn parse_public_key(public_key: &str) -> Option<VerifyingKey> {
    let bytes = hex::decode(public_key).ok()?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

#[cfg(test)]
pub(crate) mod test_support {
    use ed25519_dalek::{Signer, SigningKey};

    /// Deterministic signing key for fixtures.
    pub fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    pub fn public_key_hex() -> String {
        hex::encode(signing_key().verifying_key().to_bytes())
    }

    pub fn sign(body: &[u8], timestamp: &str) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(signing_key().sign(&message).to_bytes())
    }
}
