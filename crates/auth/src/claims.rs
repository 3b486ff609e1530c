use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

/// Claims of a Firebase ID token that matter to callable functions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

impl IdTokenClaims {
    /// Firebase uid: `sub`, falling back to `user_id`. Empty values count as missing.
    pub fn uid(&self) -> Option<&str> {
        self.sub
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.user_id.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Decodes the payload segment of a JWT without checking its signature.
pub fn decode_jwt_claims(token: &str) -> Option<IdTokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    decode_base64_json(parts[1])
}

/// Decodes base64url JSON, with or without padding.
pub fn decode_base64_json(encoded: &str) -> Option<IdTokenClaims> {
    let payload = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&payload).ok()
}
