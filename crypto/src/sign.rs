//! Ed25519 message signing and verification.

use crate::error::CryptoError;
use crate::payload::SignedPayload;
use commons_types::{PrivateKey, PublicKey, Signature};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Uses strict verification, so non-canonical signatures are rejected.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Sign the canonical encoding of a payload.
pub fn sign_payload<P: SignedPayload>(
    payload: &P,
    private_key: &PrivateKey,
) -> Result<Signature, CryptoError> {
    Ok(sign_message(&payload.signing_bytes()?, private_key))
}

/// Whether `signature` was produced by `public_key` over exactly `payload`.
pub fn verify_payload<P: SignedPayload>(
    payload: &P,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    Ok(verify_signature(&payload.signing_bytes()?, signature, public_key))
}
