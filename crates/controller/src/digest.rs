use sha2::{Digest, Sha256};

/// Hashes a password for transmission: lowercase hex of `SHA256(password)`.
///
/// The raw password never leaves the client; both `register` and `login`
/// send only this digest.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
