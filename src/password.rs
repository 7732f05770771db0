//! Password hashing and generated-credential policy
//!
//! Argon2id for storage, the OS CSPRNG for generation. Registration never
//! accepts a caller-supplied password; it issues one meeting the policy
//! below and delivers it out-of-band.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;

/// Policy floor for generated passwords
pub const MIN_GENERATED_LEN: usize = 16;

/// Symbols allowed in generated passwords
pub const ALLOWED_PUNCTUATION: &[u8] = b"@#$=%+-;";

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Hash a password with Argon2id and a fresh random salt
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(plain.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
/// A mismatch surfaces as `InvalidCredentials`, not an internal fault.
pub fn verify_password(plain: &str, stored_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored_hash)?;
    Argon2::default().verify_password(plain.as_bytes(), &parsed)?;
    Ok(())
}

/// Generate a random password: at least one lowercase, one uppercase, one
/// digit, and one allowed symbol, the rest drawn uniformly from the full
/// alphabet. The final order is shuffled with the OS CSPRNG so the
/// guaranteed-class characters carry no positional hint.
pub fn generate_password(length: usize) -> String {
    let length = length.max(MIN_GENERATED_LEN);
    let mut chars: Vec<char> = Vec::with_capacity(length);

    for class in [LOWER, UPPER, DIGITS, ALLOWED_PUNCTUATION] {
        chars.push(pick(class));
    }

    let alphabet = [LOWER, UPPER, DIGITS, ALLOWED_PUNCTUATION].concat();
    while chars.len() < length {
        chars.push(pick(&alphabet));
    }

    chars.shuffle(&mut OsRng);
    chars.into_iter().collect()
}

fn pick(set: &[u8]) -> char {
    set[OsRng.gen_range(0..set.len())] as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_meets_policy() {
        let password = generate_password(16);
        assert_eq!(password.len(), 16);
        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password
            .chars()
            .any(|c| ALLOWED_PUNCTUATION.contains(&(c as u8))));
    }

    #[test]
    fn test_generated_password_alphabet_only() {
        let alphabet = [LOWER, UPPER, DIGITS, ALLOWED_PUNCTUATION].concat();
        let password = generate_password(64);
        assert!(password.chars().all(|c| alphabet.contains(&(c as u8))));
    }

    #[test]
    fn test_short_request_clamped_to_minimum() {
        assert_eq!(generate_password(4).len(), MIN_GENERATED_LEN);
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(16), generate_password(16));
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("open-sesame").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("open-sesame", &hash).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hash = hash_password("open-sesame").unwrap();
        let err = verify_password("open-says-me", &hash).unwrap_err();
        assert!(matches!(err, crate::error::AuthError::InvalidCredentials));
    }
}
