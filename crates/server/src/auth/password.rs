use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash checked when a login names an unknown email, so the miss costs
/// the same Argon2 work as a wrong password.
static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only when `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Check a login attempt against the account's stored hash, if any.
/// A missing account or a malformed hash is a plain `false`.
pub fn check_credentials(password: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(hash) => verify_password(password, hash).unwrap_or_else(|e| {
            tracing::error!(error = %e, "stored password hash is malformed");
            false
        }),
        None => {
            let decoy = DECOY_HASH.get_or_init(|| hash_password("courtwise-decoy").ok());
            if let Some(decoy) = decoy {
                let _ = verify_password(password, decoy);
            }
            false
        }
    }
}
