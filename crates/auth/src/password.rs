//! Password hashing and verification (PBKDF2-HMAC-SHA512).
//!
//! Artifacts are encoded as `base64(salt) "." base64(hash)` — exactly one
//! delimiter. Verification re-derives with the stored salt and compares in
//! constant time; a malformed artifact verifies as `false` rather than
//! erroring (a broken stored hash must fail closed).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 100_000;

/// Hash a plaintext password with a fresh random salt.
///
/// Deliberately slow (iterated KDF); call from a blocking pool when inside
/// an async runtime.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let hash = derive(password.as_bytes(), &salt);
    format!("{}.{}", STANDARD.encode(salt), STANDARD.encode(hash))
}

/// Verify a plaintext password against a stored artifact.
///
/// Returns `false` for wrong passwords and for artifacts that do not parse
/// (wrong part count, invalid base64, unexpected hash length).
pub fn verify_password(password: &str, artifact: &str) -> bool {
    let mut parts = artifact.split('.');
    let (Some(salt_b64), Some(hash_b64), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let Ok(salt) = STANDARD.decode(salt_b64) else {
        return false;
    };
    let Ok(stored) = STANDARD.decode(hash_b64) else {
        return false;
    };
    if stored.len() != HASH_LEN {
        return false;
    }

    let derived = derive(password.as_bytes(), &salt);
    derived.as_slice().ct_eq(stored.as_slice()).into()
}

fn derive(password: &[u8], salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha512>(password, salt, PBKDF2_ROUNDS, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let artifact = hash_password("Secret123!");
        assert!(verify_password("Secret123!", &artifact));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let artifact = hash_password("Secret123!");
        assert!(!verify_password("secret123!", &artifact));
    }

    #[test]
    fn salts_differ_between_calls_but_both_verify() {
        let a = hash_password("hunter2");
        let b = hash_password("hunter2");
        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
    }

    #[test]
    fn artifact_has_exactly_one_delimiter() {
        let artifact = hash_password("pw");
        assert_eq!(artifact.matches('.').count(), 1);
    }

    #[test]
    fn malformed_artifacts_fail_closed() {
        for broken in [
            "",
            "no-delimiter",
            "a.b.c",
            "!!!!.AAAA",
            "AAAA.!!!!",
            // valid base64 but wrong hash length
            "AAAA.AAAA",
        ] {
            assert!(!verify_password("pw", broken), "accepted: {broken}");
        }
    }

    #[test]
    fn tampered_hash_does_not_verify() {
        let artifact = hash_password("pw");
        let (salt, hash) = artifact.split_once('.').unwrap();
        let mut bytes = STANDARD.decode(hash).unwrap();
        bytes[0] ^= 0x01;
        let tampered = format!("{}.{}", salt, STANDARD.encode(bytes));
        assert!(!verify_password("pw", &tampered));
    }
}
