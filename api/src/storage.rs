//! Public urls for objects kept in object storage.
//!
//! Photos can store either an absolute url or a key into the storage bucket.
//! Keys are turned into urls under the bucket's public base url. If a
//! signing secret is configured, the url also carries an expiry and an
//! HMAC-SHA256 signature which the storage proxy verifies.

use anyhow::{Context, anyhow};
use hmac::{Hmac, Mac};
use jiff::Span;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretBox};
use sha2::Sha256;

use crate::time::TimeSource;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed url stays valid.
pub const SIGNED_URL_TTL_HOURS: i64 = 1;

pub struct StorageService {
    public_base_url: Url,
    signing_secret: Option<SecretBox<String>>,
    time_source: TimeSource,
}

impl StorageService {
    pub fn new(
        public_base_url: &str,
        signing_secret: Option<SecretBox<String>>,
        time_source: TimeSource,
    ) -> anyhow::Result<Self> {
        let public_base_url = Url::parse(public_base_url).with_context(|| {
            format!("Invalid storage url: {public_base_url}")
        })?;
        if public_base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "Storage url can't be a base: {public_base_url}"
            ));
        }
        Ok(Self {
            public_base_url,
            signing_secret,
            time_source,
        })
    }

    /// Resolve a storage key to a url that a browser can fetch.
    ///
    /// Keys containing `.` or `..` segments are rejected, since the url
    /// would drop them and no longer name the key that was signed.
    #[tracing::instrument(skip(self), err)]
    pub async fn public_url(&self, key: &str) -> anyhow::Result<String> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(anyhow!("Empty storage key"));
        }
        if key.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(anyhow!("Relative segment in storage key: {key}"));
        }

        let mut url = self.public_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Storage url can't be a base"))?
            .pop_if_empty()
            .extend(key.split('/'));

        if let Some(secret) = &self.signing_secret {
            let expires = self
                .time_source
                .unix_seconds_after(Span::new().hours(SIGNED_URL_TTL_HOURS));
            let signature = sign(secret, key, expires)?;
            url.query_pairs_mut()
                .append_pair("expires", &expires.to_string())
                .append_pair("signature", &signature);
        }

        Ok(url.into())
    }
}

fn sign(
    secret: &SecretBox<String>,
    key: &str,
    expires: i64,
) -> anyhow::Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .context("Failed to initialize storage url signer")?;
    mac.update(format!("{key}:{expires}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
