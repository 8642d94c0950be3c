//! Password login for site admins.
//!
//! Hashes are argon2id in PHC string format. Verification and hashing run on
//! the blocking pool so they don't stall request handling.

use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
    Version,
};
use payloads::UserId;
use secrecy::{ExposeSecret, SecretBox};
use sqlx::PgPool;

use crate::store::{self, StoreError};
use crate::telemetry::spawn_blocking_with_tracing;
use crate::time::TimeSource;

/// Verified against when the username is unknown, so both cases take the
/// same time.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
    gZiV/M1gPc22ElAH/Jh1Hw$\
    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

#[derive(serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    password: SecretBox<String>,
}

/// Check a username and password, returning the account they belong to.
///
/// Deleted accounts can't log in.
#[tracing::instrument(name = "Validate credentials", skip(credentials, pool))]
pub async fn validate_credentials(
    credentials: Credentials,
    pool: &PgPool,
) -> Result<UserId, AuthError> {
    let Credentials { username, password } = credentials;
    let stored = store::read_password_hash(&username, pool)
        .await
        .context("Failed to read stored credentials")?;
    let (user_id, expected_hash) = match stored {
        Some((user_id, hash)) => (Some(user_id), hash),
        None => (None, DUMMY_PASSWORD_HASH.to_string()),
    };
    let expected_hash = SecretBox::new(Box::new(expected_hash));

    spawn_blocking_with_tracing(move || {
        verify_password_hash(&expected_hash, &password)
    })
    .await
    .context("Password verification task failed")??;

    user_id
        .ok_or_else(|| anyhow::anyhow!("No account named {username}"))
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
fn verify_password_hash(
    expected_hash: &SecretBox<String>,
    candidate: &SecretBox<String>,
) -> Result<(), AuthError> {
    let expected_hash = PasswordHash::new(expected_hash.expose_secret())
        .context("Stored hash is not a PHC string")?;
    Argon2::default()
        .verify_password(candidate.expose_secret().as_bytes(), &expected_hash)
        .context("Password mismatch")
        .map_err(AuthError::InvalidCredentials)
}

/// An account to provision. There is no sign-up route; accounts come from
/// operators and test fixtures.
pub struct NewUserDetails {
    pub username: String,
    pub email: String,
    pub password: SecretBox<String>,
}

#[tracing::instrument(
    name = "Create user",
    skip(details, pool, time_source),
    fields(username = %details.username, user_id = tracing::field::Empty)
)]
pub async fn create_user(
    details: NewUserDetails,
    pool: &PgPool,
    time_source: &TimeSource,
) -> Result<UserId, StoreError> {
    let NewUserDetails {
        username,
        email,
        password,
    } = details;
    let password_hash =
        spawn_blocking_with_tracing(move || hash_password(&password))
            .await
            .map_err(anyhow::Error::from)??;
    let user = store::create_user(
        pool,
        &username,
        &email,
        password_hash.expose_secret(),
        time_source,
    )
    .await?;
    tracing::Span::current()
        .record("user_id", tracing::field::display(&user.id));
    Ok(user.id)
}

fn hash_password(
    password: &SecretBox<String>,
) -> anyhow::Result<SecretBox<String>> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| anyhow::anyhow!("Invalid argon2 params: {e}"))?;
    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?
        .to_string();
    Ok(SecretBox::new(Box::new(hash)))
}
