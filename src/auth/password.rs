//! Password hashing and verification using bcrypt.

use crate::error::AuthError;

/// bcrypt only reads this many bytes of input. Longer passwords are refused instead of being
/// silently truncated, so two passwords sharing a 72-byte prefix never match each other.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Plaintext hashed once at construction to give `verify_dummy` something real to compare with.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

/// Password hasher with a configurable bcrypt cost.
///
/// Each hash embeds a random salt, so hashing the same password twice yields different strings
/// that both verify. Comparison is done by bcrypt in constant time.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost (4..=31).
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = hash_with_cost(DUMMY_PASSWORD, cost)?;

        Ok(Self { cost, dummy_hash })
    }

    /// Hash a password with a fresh salt.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the password is longer than [`MAX_PASSWORD_BYTES`].
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::InvalidRequest(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        hash_with_cost(password, self.cost)
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed hash is treated as a mismatch. It is logged at debug level only, so a client
    /// can never tell "wrong password" apart from "corrupt hash". A password longer than
    /// [`MAX_PASSWORD_BYTES`] never matches, but still costs one bcrypt round.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            let _ = bcrypt::verify(&password.as_bytes()[..MAX_PASSWORD_BYTES], &self.dummy_hash);
            return false;
        }

        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!("Failed to parse password hash: {:?}", e);
                false
            }
        }
    }

    /// Run one verification against an internal hash and discard the result.
    ///
    /// Called on login for unknown emails so that response time does not reveal whether an
    /// account exists.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

fn hash_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        AuthError::Internal(format!("Failed to hash password: {}", e))
    })
}
