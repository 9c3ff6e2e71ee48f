//! PKCE and `OpenID` Connect helpers for the customer login flow.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::shopify::ShopifyError;

/// Length of the generated code verifier (RFC 7636 allows 43-128).
const VERIFIER_LEN: usize = 64;

/// A PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct Pkce {
    /// Kept in the session and sent with the token exchange.
    pub verifier: String,
    /// Sent with the authorization request.
    pub challenge: String,
}

impl Pkce {
    /// Generate a fresh verifier/challenge pair.
    #[must_use]
    pub fn generate() -> Self {
        let verifier = random_string(VERIFIER_LEN);
        let challenge = code_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// S256 code challenge: `BASE64URL(SHA256(verifier))` without padding.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Generate a cryptographically secure alphanumeric string.
#[must_use]
pub fn random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[derive(Deserialize)]
struct IdTokenClaims {
    nonce: Option<String>,
}

/// Read the `nonce` claim from an ID token.
///
/// The signature is not verified: the token was received directly from
/// Shopify's token endpoint over TLS, and only the nonce is needed to tie it
/// to the login that started the flow.
///
/// # Errors
///
/// Returns `ShopifyError::OAuth` if the token is not a well-formed JWT.
pub fn id_token_nonce(id_token: &str) -> Result<Option<String>, ShopifyError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| ShopifyError::OAuth("Malformed id token".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ShopifyError::OAuth(format!("Malformed id token payload: {e}")))?;

    let claims: IdTokenClaims = serde_json::from_slice(&bytes)?;
    Ok(claims.nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_generate() {
        let pkce = Pkce::generate();
        assert_eq!(pkce.verifier.len(), VERIFIER_LEN);
        assert!(pkce.verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(pkce.challenge, code_challenge(&pkce.verifier));
        assert_ne!(Pkce::generate().verifier, pkce.verifier);
    }

    fn jwt(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_id_token_nonce() {
        let token = jwt(&serde_json::json!({ "sub": "gid://shopify/Customer/1", "nonce": "n-123" }));
        assert_eq!(id_token_nonce(&token).ok().flatten().as_deref(), Some("n-123"));

        let token = jwt(&serde_json::json!({ "sub": "gid://shopify/Customer/1" }));
        assert_eq!(id_token_nonce(&token).ok().flatten(), None);
    }

    #[test]
    fn test_id_token_nonce_malformed() {
        assert!(matches!(id_token_nonce("not-a-jwt"), Err(ShopifyError::OAuth(_))));
        assert!(id_token_nonce("a.!!!.c").is_err());
    }
}
