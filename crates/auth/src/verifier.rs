use crate::claims::{decode_base64_json, decode_jwt_claims, IdTokenClaims};
use crate::keys::PublicKeys;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation};
use house_worker_core::AuthContext;
use thiserror::Error;

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const GATEWAY_USERINFO_HEADER: &str = "x-apigateway-api-userinfo";
pub const SECURE_TOKEN_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Allowed clock difference when checking `iat`.
const CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed credential: {0}")]
    Malformed(String),
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),
    #[error("Token expired")]
    Expired,
    #[error("Invalid signature: {0}")]
    Signature(String),
    #[error("Could not load signing keys: {0}")]
    KeyFetch(String),
}

/// Credential material extracted from a request's headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    pub authorization: Option<String>,
    pub gateway_userinfo: Option<String>,
}

impl RequestCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            authorization: Some(format!("Bearer {}", token.into())),
            gateway_userinfo: None,
        }
    }
}

/// Turns request credentials into an [`AuthContext`].
///
/// Returns an anonymous context when no credential is present and an error
/// when a credential is present but unusable.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, credentials: &RequestCredentials) -> Result<AuthContext, AuthError>;

    fn name(&self) -> &str;
}

/// Trusts claims forwarded by an API gateway that already verified the token.
///
/// The header is taken at face value, so the service must only be reachable
/// through the gateway.
pub struct GatewayVerifier;

#[async_trait]
impl AuthVerifier for GatewayVerifier {
    async fn verify(&self, credentials: &RequestCredentials) -> Result<AuthContext, AuthError> {
        let Some(userinfo) = credentials.gateway_userinfo.as_deref() else {
            return Ok(AuthContext::anonymous());
        };

        let claims = decode_base64_json(userinfo.trim())
            .ok_or_else(|| AuthError::Malformed("gateway user info is not base64 JSON".to_string()))?;
        let uid = claims
            .uid()
            .ok_or_else(|| AuthError::InvalidClaims("missing subject".to_string()))?;

        Ok(AuthContext::user(uid))
    }

    fn name(&self) -> &str {
        "gateway"
    }
}

/// How an ID token's signature is checked.
pub enum SignatureCheck {
    /// RS256 against Google's published keys.
    Verified(PublicKeys),
    /// Tokens from the Auth emulator, which are unsigned.
    Emulator,
}

/// Reads a Firebase ID token from `Authorization: Bearer` and checks its
/// signature and claims.
pub struct IdTokenVerifier {
    project_id: String,
    signatures: SignatureCheck,
}

impl IdTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_keys(project_id, PublicKeys::default())
    }

    pub fn with_keys(project_id: impl Into<String>, keys: PublicKeys) -> Self {
        Self {
            project_id: project_id.into(),
            signatures: SignatureCheck::Verified(keys),
        }
    }

    /// Accepts unsigned tokens as minted by the Auth emulator.
    pub fn emulator(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            signatures: SignatureCheck::Emulator,
        }
    }

    pub fn checks_signatures(&self) -> bool {
        matches!(self.signatures, SignatureCheck::Verified(_))
    }

    pub fn expected_issuer(&self) -> String {
        format!("{}{}", SECURE_TOKEN_ISSUER_PREFIX, self.project_id)
    }

    /// Validates `claims` at unix time `now`.
    pub fn check_claims(&self, claims: &IdTokenClaims, now: i64) -> Result<String, AuthError> {
        if claims.aud.as_deref() != Some(self.project_id.as_str()) {
            return Err(AuthError::InvalidClaims(format!(
                "audience {:?} does not match project {}",
                claims.aud, self.project_id
            )));
        }

        let issuer = self.expected_issuer();
        if claims.iss.as_deref() != Some(issuer.as_str()) {
            return Err(AuthError::InvalidClaims(format!(
                "issuer {:?} does not match {}",
                claims.iss, issuer
            )));
        }

        match claims.exp {
            Some(exp) if exp > now => {}
            Some(_) => return Err(AuthError::Expired),
            None => return Err(AuthError::InvalidClaims("missing exp".to_string())),
        }

        if let Some(iat) = claims.iat {
            if iat > now.saturating_add(CLOCK_SKEW_SECS) {
                return Err(AuthError::InvalidClaims("token issued in the future".to_string()));
            }
        }

        claims
            .uid()
            .map(str::to_string)
            .ok_or_else(|| AuthError::InvalidClaims("missing subject".to_string()))
    }

    /// Decodes `token`, checking its signature unless running against the emulator.
    async fn decode(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let keys = match &self.signatures {
            SignatureCheck::Emulator => {
                return decode_jwt_claims(token)
                    .ok_or_else(|| AuthError::Malformed("token is not a JWT".to_string()));
            }
            SignatureCheck::Verified(keys) => keys,
        };

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::Malformed(format!("token header: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::Signature(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Signature("missing key id".to_string()))?;
        let key = keys.key(&kid).await?;

        // Claims are checked by `check_claims` so errors stay specific.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<IdTokenClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Signature(e.to_string()))
    }

    pub async fn verify_at(
        &self,
        credentials: &RequestCredentials,
        now: i64,
    ) -> Result<AuthContext, AuthError> {
        let Some(header) = credentials.authorization.as_deref() else {
            return Ok(AuthContext::anonymous());
        };

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Malformed("expected a Bearer token".to_string()))?;

        let claims = self.decode(token).await?;
        let uid = self.check_claims(&claims, now)?;
        tracing::debug!(uid = %uid, "ID token accepted");
        Ok(AuthContext::user(uid))
    }
}

#[async_trait]
impl AuthVerifier for IdTokenVerifier {
    async fn verify(&self, credentials: &RequestCredentials) -> Result<AuthContext, AuthError> {
        self.verify_at(credentials, chrono::Utc::now().timestamp()).await
    }

    fn name(&self) -> &str {
        "id_token"
    }
}
