//! Caller identification for callable requests.

pub mod claims;
pub mod keys;
pub mod verifier;

pub use claims::{decode_jwt_claims, IdTokenClaims};
pub use keys::PublicKeys;
pub use verifier::{AuthError, AuthVerifier, GatewayVerifier, IdTokenVerifier, RequestCredentials};
