#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use house_worker_auth::{AuthError, AuthVerifier, IdTokenVerifier, PublicKeys, RequestCredentials};
use house_worker_core::AuthContext;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "house-worker-dev";
const KID: &str = "test-key-1";
const SIGNING_KEY: &[u8] = include_bytes!("fixtures/test_signing_key.pem");
const JWKS: &str = include_str!("fixtures/test_jwks.json");

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn claims(uid: &str) -> Value {
    json!({
        "iss": format!("https://securetoken.google.com/{}", PROJECT),
        "aud": PROJECT,
        "sub": uid,
        "user_id": uid,
        "iat": now() - 5,
        "exp": now() + 3600,
    })
}

fn sign(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_rsa_pem(SIGNING_KEY).unwrap()).unwrap()
}

async fn key_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    let jwks: Value = serde_json::from_str(JWKS).unwrap();
    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "public, max-age=19800, must-revalidate")
                .set_body_json(jwks),
        )
        .expect(expected_fetches)
        .mount(&server)
        .await;
    server
}

fn verifier(server: &MockServer) -> IdTokenVerifier {
    IdTokenVerifier::with_keys(PROJECT, PublicKeys::with_url(format!("{}/keys", server.uri())))
}

#[tokio::test]
async fn test_signed_token_accepted() {
    let server = key_server(1).await;
    let token = sign(KID, &claims("abc123"));

    let ctx = verifier(&server)
        .verify(&RequestCredentials::bearer(token))
        .await
        .unwrap();

    assert_eq!(ctx, AuthContext::user("abc123"));
}

#[tokio::test]
async fn test_keys_fetched_once_for_many_tokens() {
    let server = key_server(1).await;
    let verifier = verifier(&server);

    for uid in ["u1", "u2", "u3"] {
        let ctx = verifier
            .verify(&RequestCredentials::bearer(sign(KID, &claims(uid))))
            .await
            .unwrap();
        assert_eq!(ctx.caller_id.as_deref(), Some(uid));
    }
}

#[tokio::test]
async fn test_junk_signature_rejected() {
    let server = key_server(1).await;
    let token = sign(KID, &claims("abc123"));
    let (signed_part, _) = token.rsplit_once('.').unwrap();
    let forged = format!("{}.Z2FyYmFnZS1zaWduYXR1cmU", signed_part);

    let result = verifier(&server).verify(&RequestCredentials::bearer(forged)).await;

    assert!(matches!(result, Err(AuthError::Signature(_))), "{:?}", result);
}

#[tokio::test]
async fn test_swapped_payload_rejected() {
    let server = key_server(1).await;
    let genuine = sign(KID, &claims("abc123"));
    let victim = sign(KID, &claims("victim-uid"));

    let parts: Vec<&str> = genuine.split('.').collect();
    let victim_payload = victim.split('.').nth(1).unwrap();
    let forged = format!("{}.{}.{}", parts[0], victim_payload, parts[2]);

    let result = verifier(&server).verify(&RequestCredentials::bearer(forged)).await;

    assert!(matches!(result, Err(AuthError::Signature(_))), "{:?}", result);
}

#[tokio::test]
async fn test_unknown_key_id_rejected() {
    let server = key_server(1).await;
    let token = sign("rotated-away", &claims("abc123"));

    let result = verifier(&server).verify(&RequestCredentials::bearer(token)).await;

    assert!(matches!(result, Err(AuthError::Signature(_))), "{:?}", result);
}

#[tokio::test]
async fn test_signed_token_still_needs_valid_claims() {
    let server = key_server(1).await;
    let mut wrong_audience = claims("abc123");
    wrong_audience["aud"] = json!("someone-elses-project");
    let token = sign(KID, &wrong_audience);

    let result = verifier(&server).verify(&RequestCredentials::bearer(token)).await;

    assert!(matches!(result, Err(AuthError::InvalidClaims(_))), "{:?}", result);
}

#[tokio::test]
async fn test_key_endpoint_failure_is_key_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let token = sign(KID, &claims("abc123"));
    let result = verifier(&server).verify(&RequestCredentials::bearer(token)).await;

    assert!(matches!(result, Err(AuthError::KeyFetch(_))), "{:?}", result);
}
