use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::shared::error::AuthError;

/// Argon2 hashing for every secret the service stores: passwords, OTPs,
/// refresh tokens and password reset tokens.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl Hasher {
    /// Minimal-cost parameters, only for tests.
    #[cfg(test)]
    pub fn fast() -> Self {
        use argon2::{Algorithm, Params, Version};

        let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        // PHC string ($argon2id$v=19$...)
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|_| AuthError::ArgonError)?
            .to_string();
        Ok(hash)
    }

    /// Returns `Ok(false)` on mismatch; errors only when the stored hash is malformed.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::ArgonError)?;
        Ok(self
            .argon2
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
