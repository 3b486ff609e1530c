//! Public keys Google signs Firebase ID tokens with.

use crate::verifier::AuthError;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const SECURE_TOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Used when the key response carries no `max-age`.
const DEFAULT_KEY_TTL_SECS: u64 = 3600;
const MAX_KEY_TTL_SECS: u64 = 24 * 3600;
const KEY_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<RsaJwk>,
}

#[derive(Debug, Deserialize)]
struct RsaJwk {
    kid: String,
    n: String,
    e: String,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    expires_at: Instant,
}

/// Fetches and caches the signing keys, honouring `Cache-Control: max-age`.
pub struct PublicKeys {
    client: reqwest::Client,
    url: String,
    cache: RwLock<Option<CachedKeys>>,
}

impl Default for PublicKeys {
    fn default() -> Self {
        Self::with_url(SECURE_TOKEN_JWKS_URL)
    }
}

impl PublicKeys {
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(KEY_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            cache: RwLock::new(None),
        }
    }

    /// Key for `kid`, refreshing the cached set once it has expired.
    pub async fn key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.expires_at > Instant::now()) {
                return lookup(&cached.keys, kid);
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.expires_at > Instant::now()) {
            return lookup(&cached.keys, kid);
        }

        let fresh = self.fetch().await?;
        let key = lookup(&fresh.keys, kid);
        *cache = Some(fresh);
        key
    }

    async fn fetch(&self) -> Result<CachedKeys, AuthError> {
        tracing::debug!("Fetching token signing keys from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "key request failed: {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_KEY_TTL_SECS)
            .min(MAX_KEY_TTL_SECS);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in set.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => tracing::warn!(kid = %jwk.kid, "Skipping unusable signing key: {}", e),
            }
        }

        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        })
    }
}

fn lookup(keys: &HashMap<String, DecodingKey>, kid: &str) -> Result<DecodingKey, AuthError> {
    keys.get(kid)
        .cloned()
        .ok_or_else(|| AuthError::Signature(format!("unknown signing key {}", kid)))
}

/// `max-age` seconds from a `Cache-Control` value.
fn max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_max_age() {
        assert_eq!(
            max_age("public, max-age=19800, must-revalidate, no-transform"),
            Some(19800)
        );
        assert_eq!(max_age("no-cache"), None);
        assert_eq!(max_age("max-age=abc"), None);
    }
}
