use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use sha2::{Digest, Sha256};

use crate::mining::Address;

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed, address).
pub fn generate_keypair_hex() -> (String, String, Address) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    let sk_hex = hex::encode(sk.secret_bytes());
    let pk_hex = hex::encode(pk.serialize()); // compressed (33 bytes)
    (sk_hex, pk_hex, address_of(&pk))
}

/// Account address: the last 20 bytes of SHA-256(compressed pubkey).
pub fn address_of(pk: &PublicKey) -> Address {
    let digest = Sha256::digest(pk.serialize());
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

/// Derive the account address from a hex pubkey.
pub fn pubkey_to_address(pubkey_hex: &str) -> Result<Address, &'static str> {
    let bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&bytes).map_err(|_| "invalid pubkey bytes")?;
    Ok(address_of(&pk))
}

/// What a client signs for each mutating request: SHA-256 over the
/// length-prefixed action name, `issued_at` (big-endian) and the body JSON
/// exactly as it appears on the wire. Formatting and hex case are the
/// client's choice; the bytes signed are the bytes sent.
pub fn action_sighash(action: &str, issued_at: i64, body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((action.len() as u32).to_be_bytes());
    hasher.update(action.as_bytes());
    hasher.update(issued_at.to_be_bytes());
    hasher.update(body);
    hasher.finalize().into()
}

/// Sign a 32-byte message hash; returns hex DER.
pub fn sign_hex(secret_hex: &str, msg32: [u8; 32]) -> Result<String, &'static str> {
    let secp = Secp256k1::signing_only();
    let bytes = hex::decode(secret_hex).map_err(|_| "invalid secret key hex")?;
    let sk = SecretKey::from_slice(&bytes).map_err(|_| "invalid secret key bytes")?;
    let msg = Message::from_digest_slice(&msg32).map_err(|_| "invalid message length")?;
    Ok(hex::encode(secp.sign_ecdsa(&msg, &sk).serialize_der()))
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed) and message hash.
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, &'static str> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| "invalid signature hex")?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| "invalid DER signature")?;

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| "invalid pubkey bytes")?;

    let msg = Message::from_digest_slice(&msg32).map_err(|_| "invalid message length")?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

/// Check a signed request and return the signer's address.
pub fn authenticate(
    action: &str,
    issued_at: i64,
    body: &[u8],
    pubkey_hex: &str,
    sig_hex: &str,
) -> Result<Address, &'static str> {
    let sighash = action_sighash(action, issued_at, body);
    if !verify_signature_hex(pubkey_hex, sig_hex, sighash)? {
        return Err("invalid signature");
    }
    pubkey_to_address(pubkey_hex)
}
