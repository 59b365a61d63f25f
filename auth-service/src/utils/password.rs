use rand::{rngs::OsRng, Rng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::HashingConfig;

/// Algorithm tag written into every digest.
pub const ALGORITHM: &str = "sha256";

const DELIMITER: char = '$';
const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Newtype for a stored credential digest:
/// `algorithm$iterations$salt_hex$key_hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password with PBKDF2-HMAC-SHA256.
///
/// Every call draws a fresh 32-byte salt from the OS and an iteration count
/// from the configured range, so hashing the same password twice never
/// yields the same digest.
pub fn hash_password(password: &Password, config: &HashingConfig) -> PasswordHashString {
    let iterations = OsRng.gen_range(config.min_iterations..=config.max_iterations);

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_str().as_bytes(), &salt, iterations, &mut key);

    PasswordHashString::new(format!(
        "{ALGORITHM}{DELIMITER}{iterations}{DELIMITER}{}{DELIMITER}{}",
        hex::encode(salt),
        hex::encode(key)
    ))
}

/// Verify a candidate password against a stored digest.
///
/// The key is re-derived with the digest's own iterations and salt and
/// compared in constant time. Any malformed digest fails closed.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    let Some(parts) = DigestParts::parse(password_hash.as_str()) else {
        tracing::warn!("Stored credential digest could not be parsed");
        return false;
    };

    let mut derived = vec![0u8; parts.key.len()];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_str().as_bytes(),
        &parts.salt,
        parts.iterations,
        &mut derived,
    );

    derived.ct_eq(&parts.key).into()
}

struct DigestParts {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl DigestParts {
    fn parse(digest: &str) -> Option<Self> {
        let mut fields = digest.split(DELIMITER);
        let (algorithm, iterations, salt, key) =
            (fields.next()?, fields.next()?, fields.next()?, fields.next()?);
        if fields.next().is_some() || algorithm != ALGORITHM {
            return None;
        }

        let iterations: u32 = iterations.parse().ok().filter(|n| *n > 0)?;
        let salt = hex::decode(salt).ok()?;
        let key = hex::decode(key).ok().filter(|k| !k.is_empty())?;

        Some(Self {
            iterations,
            salt,
            key,
        })
    }
}
