use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SESSION_TOKEN_BYTES: usize = 32;

/// Legacy scheme: a single unsalted SHA-256 pass encoded as lowercase hex.
/// Kept as-is so password records written by the previous system keep
/// verifying; see DESIGN.md for the upgrade decision.
pub(crate) fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

pub(crate) fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_matches_known_digest() {
        // echo -n "password" | sha256sum
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn verify_password_roundtrip() {
        let hash = hash_password("correct-horse-battery-staple");
        assert!(verify_password("correct-horse-battery-staple", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn session_tokens_are_unique_hex() {
        let first = generate_session_token();
        let second = generate_session_token();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
