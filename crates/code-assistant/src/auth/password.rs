//! Salted PBKDF2-HMAC-SHA256 password hashing
//!
//! Stored form: `<iterations>$<salt hex>$<hash hex>`.

use rand::RngCore;
use ring::pbkdf2;
use std::num::NonZeroU32;

use crate::error::Result;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str, iterations: u32) -> Result<String> {
    let iterations = NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN);

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, iterations, &salt, password.as_bytes(), &mut hash);

    Ok(format!("{}${}${}", iterations, hex::encode(salt), hex::encode(hash)))
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let (Ok(iterations), Ok(salt), Ok(expected)) =
        (iterations.parse::<NonZeroU32>(), hex::decode(salt), hex::decode(expected))
    else {
        return false;
    };

    pbkdf2::verify(pbkdf2::PBKDF2_HMAC_SHA256, iterations, &salt, password.as_bytes(), &expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("hunter22", 50).unwrap();
        assert!(stored.starts_with("50$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same", 10).unwrap();
        let b = hash_password("same", 10).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_iterations_clamped() {
        let stored = hash_password("pw", 0).unwrap();
        assert!(stored.starts_with("1$"));
        assert!(verify_password("pw", &stored));
    }

    #[test]
    fn test_malformed_hash_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "abc$def"));
        assert!(!verify_password("x", "10$zz$00"));
        assert!(!verify_password("x", "0$00$00"));
    }

    #[test]
    fn test_known_pbkdf2_vector() {
        // RFC 7914 section 11, first 32 bytes
        let stored = "1$73616c74$55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc";
        assert!(verify_password("passwd", stored));
        assert!(!verify_password("passwd2", stored));
    }
}
