//! Customer login via the Shopify Customer Account API.
//!
//! Implements the OAuth 2.0 authorization code flow with PKCE:
//!
//! 1. `/account/login` stores state, nonce and the PKCE verifier in the
//!    session and redirects to Shopify.
//! 2. Shopify redirects back to `/account/authorize` with a code.
//! 3. The code is exchanged for tokens, the id token nonce is checked and
//!    the token is stored in the session.
//!
//! Every callback failure redirects to `/?login_error=<code>`.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user};
use crate::middleware::{clear_customer_token, set_customer_token};
use crate::models::session_keys;
use crate::shopify::customer::{Pkce, id_token_nonce, random_string};
use crate::shopify::types::CartBuyerIdentityInput;
use crate::shopify::CustomerAccessToken;
use crate::state::AppState;

/// Length of the generated state and nonce values.
const STATE_LEN: usize = 32;

/// Longest provider error code passed through to the home page.
const MAX_ERROR_CODE_LEN: usize = 64;

/// Why a login callback failed, reported as `?login_error=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    /// State missing or not matching the one stored at login.
    InvalidState,
    /// No authorization code in the callback.
    MissingCode,
    /// The code could not be exchanged for tokens.
    TokenExchange,
    /// The id token nonce did not match the one stored at login.
    InvalidNonce,
    /// The session could not be updated.
    Session,
}

impl LoginError {
    /// Query parameter value.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidState => "invalid_state",
            Self::MissingCode => "missing_code",
            Self::TokenExchange => "token_exchange_failed",
            Self::InvalidNonce => "invalid_nonce",
            Self::Session => "session_error",
        }
    }
}

fn login_error_redirect(code: &str) -> Redirect {
    Redirect::to(&format!("/?login_error={}", urlencoding::encode(code)))
}

/// Keep provider error codes (`access_denied`, ...) safe to echo.
fn provider_error_code(error: &str) -> &str {
    let valid = !error.is_empty()
        && error.len() <= MAX_ERROR_CODE_LEN
        && error
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid { error } else { "authorization_failed" }
}

/// OAuth callback query parameters.
#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Start the login flow.
///
/// Redirects to the Customer Account authorization endpoint.
#[instrument(skip(state, session))]
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let oauth_state = random_string(STATE_LEN);
    let nonce = random_string(STATE_LEN);
    let pkce = Pkce::generate();

    session.insert(session_keys::OAUTH_STATE, &oauth_state).await?;
    session.insert(session_keys::OAUTH_NONCE, &nonce).await?;
    session
        .insert(session_keys::OAUTH_VERIFIER, &pkce.verifier)
        .await?;

    let url = state.customer().authorization_url(
        &state.oauth_redirect_uri(),
        &oauth_state,
        &nonce,
        &pkce.challenge,
    );

    tracing::debug!("Redirecting to Customer Account login");
    Ok(Redirect::to(&url))
}

/// OAuth callback.
#[instrument(skip(state, session, query))]
pub async fn authorize(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AuthorizeQuery>,
) -> Redirect {
    match complete_login(&state, &session, query).await {
        Ok(()) => Redirect::to("/account"),
        Err(code) => login_error_redirect(&code),
    }
}

/// Validate the callback and store the token. Errors are `login_error` codes.
async fn complete_login(
    state: &AppState,
    session: &Session,
    query: AuthorizeQuery,
) -> std::result::Result<(), String> {
    // One-shot values: removed whatever the outcome
    let expected_state = take(session, session_keys::OAUTH_STATE).await;
    let expected_nonce = take(session, session_keys::OAUTH_NONCE).await;
    let verifier = take(session, session_keys::OAUTH_VERIFIER).await;

    if let Some(error) = query.error.as_deref() {
        tracing::info!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "Customer login denied"
        );
        return Err(provider_error_code(error).to_string());
    }

    let (Some(expected_state), Some(returned_state)) = (expected_state, query.state) else {
        return Err(LoginError::InvalidState.code().to_string());
    };
    if expected_state != returned_state {
        tracing::warn!("OAuth state mismatch");
        return Err(LoginError::InvalidState.code().to_string());
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Err(LoginError::MissingCode.code().to_string());
    };
    let Some(verifier) = verifier else {
        return Err(LoginError::InvalidState.code().to_string());
    };

    let token = state
        .customer()
        .exchange_code(&code, &state.oauth_redirect_uri(), &verifier)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Token exchange failed");
            LoginError::TokenExchange.code().to_string()
        })?;

    verify_nonce(&token, expected_nonce.as_deref())
        .map_err(|e| e.code().to_string())?;

    // New privilege level, new session ID
    let stored = async {
        session.cycle_id().await?;
        set_customer_token(session, &token).await
    };
    stored.await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store customer token");
        LoginError::Session.code().to_string()
    })?;

    attach_cart(state, session, &token).await;
    add_breadcrumb("auth", "Customer signed in", None);
    Ok(())
}

/// The id token must carry the nonce stored at login.
fn verify_nonce(
    token: &CustomerAccessToken,
    expected: Option<&str>,
) -> std::result::Result<(), LoginError> {
    let (Some(id_token), Some(expected)) = (token.id_token.as_deref(), expected) else {
        return Err(LoginError::InvalidNonce);
    };

    match id_token_nonce(id_token) {
        Ok(Some(nonce)) if nonce == expected => Ok(()),
        Ok(_) => {
            tracing::warn!("Id token nonce mismatch");
            Err(LoginError::InvalidNonce)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable id token");
            Err(LoginError::InvalidNonce)
        }
    }
}

/// Remove and return a one-shot session value.
async fn take(session: &Session, key: &str) -> Option<String> {
    session.remove::<String>(key).await.ok().flatten()
}

/// Give an anonymous cart to the customer who just signed in.
async fn attach_cart(state: &AppState, session: &Session, token: &CustomerAccessToken) {
    let Ok(Some(cart_id)) = session.get::<String>(session_keys::CART_ID).await else {
        return;
    };

    let identity = CartBuyerIdentityInput {
        customer_access_token: Some(token.access_token.clone()),
        ..CartBuyerIdentityInput::default()
    };
    if let Err(e) = state
        .storefront()
        .update_buyer_identity(&cart_id, identity)
        .await
    {
        tracing::warn!(error = %e, "Failed to attach cart to customer");
    }
}

/// Sign out.
///
/// Ends the Shopify session too when an id token is available.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let token: Option<CustomerAccessToken> = session
        .get(session_keys::CUSTOMER_TOKEN)
        .await
        .ok()
        .flatten();

    clear_customer_token(&session).await?;
    clear_sentry_user();

    let target = token
        .and_then(|t| t.id_token)
        .map_or_else(
            || "/".to_string(),
            |id_token| {
                state
                    .customer()
                    .logout_url(&id_token, &state.config().base_url)
            },
        );

    Ok(Redirect::to(&target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    fn token_with_nonce(nonce: Option<&str>) -> CustomerAccessToken {
        let claims = nonce.map_or_else(
            || serde_json::json!({ "sub": "1" }),
            |n| serde_json::json!({ "sub": "1", "nonce": n }),
        );
        let id_token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        CustomerAccessToken {
            access_token: "at".to_string(),
            id_token: Some(id_token),
            refresh_token: None,
            expires_in: Some(3600),
            obtained_at: 0,
        }
    }

    #[test]
    fn test_verify_nonce() {
        assert_eq!(verify_nonce(&token_with_nonce(Some("abc")), Some("abc")), Ok(()));
        assert_eq!(
            verify_nonce(&token_with_nonce(Some("abc")), Some("xyz")),
            Err(LoginError::InvalidNonce)
        );
        assert_eq!(
            verify_nonce(&token_with_nonce(None), Some("abc")),
            Err(LoginError::InvalidNonce)
        );
        assert_eq!(
            verify_nonce(&token_with_nonce(Some("abc")), None),
            Err(LoginError::InvalidNonce)
        );
    }

    #[test]
    fn test_provider_error_code() {
        assert_eq!(provider_error_code("access_denied"), "access_denied");
        assert_eq!(
            provider_error_code("<script>alert(1)</script>"),
            "authorization_failed"
        );
        assert_eq!(provider_error_code(""), "authorization_failed");
    }

    #[test]
    fn test_login_error_redirect() {
        use axum::response::IntoResponse;

        let response = login_error_redirect(LoginError::InvalidState.code()).into_response();
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/?login_error=invalid_state")
        );
    }
}
