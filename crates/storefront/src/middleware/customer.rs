//! Customer session extractors.
//!
//! The customer's Customer Account API token lives in the session after a
//! successful login. These extractors read it back, refreshing it first when
//! it has expired.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::session_keys;
use crate::shopify::CustomerAccessToken;
use crate::state::AppState;

/// Where signed-out visitors are sent.
pub const LOGIN_PATH: &str = "/account/login";

/// Extractor that requires a signed-in customer.
///
/// Expired tokens with a refresh token are refreshed transparently and the
/// new token is written back to the session. Otherwise the visitor is sent to
/// the login page (or gets a 401 on `/api/` paths).
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(
///     State(state): State<AppState>,
///     RequireCustomer(token): RequireCustomer,
/// ) -> Result<impl IntoResponse> {
///     let (orders, _) = state.customer().get_orders(&token.access_token, 10, None).await?;
///     // ...
/// }
/// ```
pub struct RequireCustomer(pub CustomerAccessToken);

/// Rejection when a customer session is required but missing.
pub enum CustomerRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for CustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl CustomerRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = CustomerRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let rejection = || CustomerRejection::for_path(parts.uri.path());

        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().ok_or_else(rejection)?;

        let token = current_token(session, state).await.ok_or_else(rejection)?;
        Ok(Self(token))
    }
}

/// Extractor that optionally gets the customer token.
///
/// Unlike [`RequireCustomer`], this never rejects. An expired token that
/// cannot be refreshed counts as signed out.
pub struct OptionalCustomer(pub Option<CustomerAccessToken>);

impl FromRequestParts<AppState> for OptionalCustomer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => current_token(session, state).await,
            None => None,
        };

        Ok(Self(token))
    }
}

/// Load the session token, refreshing it if it has expired.
///
/// A token that is expired and cannot be refreshed is removed from the
/// session.
async fn current_token(session: &Session, state: &AppState) -> Option<CustomerAccessToken> {
    let token: CustomerAccessToken = session
        .get(session_keys::CUSTOMER_TOKEN)
        .await
        .ok()
        .flatten()?;

    if !token.is_expired() {
        return Some(token);
    }

    if token.can_refresh() {
        match state.customer().refresh_token(&token).await {
            Ok(refreshed) => {
                if let Err(e) = set_customer_token(session, &refreshed).await {
                    tracing::warn!(error = %e, "Failed to store refreshed customer token");
                }
                return Some(refreshed);
            }
            Err(e) => tracing::info!(error = %e, "Customer token refresh failed"),
        }
    }

    if let Err(e) = clear_customer_token(session).await {
        tracing::warn!(error = %e, "Failed to clear expired customer token");
    }
    None
}

/// Response extension marking a token the Customer Account API rejected.
///
/// Set by `AppError::Unauthorized`; consumed by
/// [`customer_token_rejection_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct CustomerTokenRejected;

/// Sign the customer out once the Customer Account API rejects their token.
///
/// A token can be revoked before its local expiry. When a handler's response
/// carries [`CustomerTokenRejected`], the token is removed from the session
/// and the visitor is sent to the login page (or gets a 401 on `/api/`
/// paths).
pub async fn customer_token_rejection_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let rejection = CustomerRejection::for_path(request.uri().path());
    let response = next.run(request).await;

    if response.extensions().get::<CustomerTokenRejected>().is_none() {
        return response;
    }

    tracing::info!("Customer token rejected, signing out");
    if let Err(e) = clear_customer_token(&session).await {
        tracing::warn!(error = %e, "Failed to clear rejected customer token");
    }
    rejection.into_response()
}

/// Store the customer token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_customer_token(
    session: &Session,
    token: &CustomerAccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CUSTOMER_TOKEN, token).await
}

/// Remove the customer token from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_customer_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CustomerAccessToken>(session_keys::CUSTOMER_TOKEN)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_for_path() {
        assert!(matches!(
            CustomerRejection::for_path("/api/cart"),
            CustomerRejection::Unauthorized
        ));
        assert!(matches!(
            CustomerRejection::for_path("/account/orders"),
            CustomerRejection::RedirectToLogin
        ));
    }

    #[test]
    fn test_redirect_goes_to_login() {
        let response = CustomerRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some(LOGIN_PATH)
        );
    }
}
