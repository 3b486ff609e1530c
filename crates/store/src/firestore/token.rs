use super::constants::*;
use super::types::*;
use house_worker_core::StoreError;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

/// Where the bearer token for Firestore requests comes from.
pub enum TokenSource {
    /// A fixed token, e.g. `owner` for the emulator.
    Static(String),
    /// The instance metadata server, with caching.
    Metadata {
        url: String,
        cache: RwLock<Option<AccessToken>>,
    },
}

impl TokenSource {
    pub fn emulator() -> Self {
        TokenSource::Static(EMULATOR_TOKEN.to_string())
    }

    pub fn metadata() -> Self {
        Self::metadata_at(METADATA_BASE_URL)
    }

    pub fn metadata_at(base_url: &str) -> Self {
        TokenSource::Metadata {
            url: format!("{}{}", base_url.trim_end_matches('/'), METADATA_TOKEN_PATH),
            cache: RwLock::new(None),
        }
    }

    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, StoreError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata { url, cache } => {
                if let Some(token) = cache.read().await.as_ref() {
                    if !is_token_expired(token, now_secs()) {
                        return Ok(token.token.clone());
                    }
                }

                let mut cache = cache.write().await;
                // Another request may have refreshed while we waited for the lock.
                if let Some(token) = cache.as_ref() {
                    if !is_token_expired(token, now_secs()) {
                        return Ok(token.token.clone());
                    }
                }

                tracing::debug!("Fetching access token from metadata server");
                let token = fetch_metadata_token(client, url).await?;
                let value = token.token.clone();
                *cache = Some(token);
                Ok(value)
            }
        }
    }
}

pub async fn fetch_metadata_token(
    client: &reqwest::Client,
    url: &str,
) -> Result<AccessToken, StoreError> {
    let response = client
        .get(url)
        .header(HEADER_METADATA_FLAVOR, VALUE_METADATA_FLAVOR)
        .send()
        .await
        .map_err(|e| StoreError::Auth(e.to_string()))?;

    if !response.status().is_success() {
        return Err(StoreError::Auth(format!(
            "Token request failed: {}",
            response.status()
        )));
    }

    let token_response: MetadataTokenResponse = response
        .json()
        .await
        .map_err(|e| StoreError::Auth(e.to_string()))?;

    Ok(AccessToken {
        token: token_response.access_token,
        expires_at: now_secs().saturating_add(token_response.expires_in),
    })
}

pub fn is_token_expired(token: &AccessToken, now: u64) -> bool {
    token.expires_at <= now.saturating_add(TOKEN_REFRESH_MARGIN_SECS)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_token_refreshed_before_expiry() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: 1_000,
        };
        assert!(!is_token_expired(&token, 600));
        assert!(is_token_expired(&token, 700));
        assert!(is_token_expired(&token, 2_000));

        let forever = AccessToken {
            token: "t".to_string(),
            expires_at: u64::MAX,
        };
        assert!(is_token_expired(&forever, u64::MAX));
        assert!(!is_token_expired(&forever, 1_000));
    }

    #[tokio::test]
    async fn test_static_token() {
        let client = reqwest::Client::new();
        let token = TokenSource::emulator().access_token(&client).await.unwrap();
        assert_eq!(token, "owner");
    }
}
