//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::filters;
use crate::middleware::PageContext;
use crate::middleware::customer::{CustomerTokenRejected, LOGIN_PATH};
use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(ShopifyError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The customer's session token is no longer accepted.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<ShopifyError> for AppError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::Unauthorized(message) => Self::Unauthorized(message),
            other => Self::Shopify(other),
        }
    }
}

/// Page rendered for every 404.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub ctx: PageContext,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(ShopifyError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Shopify(ShopifyError::UserError(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Shopify(ShopifyError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Shopify(ShopifyError::Unauthorized(_)) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Shopify(ShopifyError::UserError(msg)) => msg.clone(),
            Self::Shopify(ShopifyError::RateLimited(_)) => {
                "Too many requests, please try again shortly".to_string()
            }
            // Don't expose internal error details to clients
            Self::Shopify(_) => "External service error".to_string(),
            Self::Session(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        // The session still holds the rejected token; the customer token
        // middleware clears it on the way out.
        if status == StatusCode::UNAUTHORIZED {
            let mut response = Redirect::to(LOGIN_PATH).into_response();
            response.extensions_mut().insert(CustomerTokenRejected);
            return response;
        }

        if status == StatusCode::NOT_FOUND {
            return (
                status,
                NotFoundTemplate {
                    ctx: PageContext::fallback(),
                },
            )
                .into_response();
        }

        (status, self.public_message()).into_response()
    }
}

/// Fallback handler for unmatched routes.
pub async fn not_found(ctx: PageContext) -> Response {
    (StatusCode::NOT_FOUND, NotFoundTemplate { ctx }).into_response()
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a signed-in customer.
///
/// Call this after successful authentication to associate errors with customers.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("variant_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_rejected_token_redirects_to_login() {
        let err = AppError::from(ShopifyError::Unauthorized("token rejected".to_string()));
        assert!(matches!(err, AppError::Unauthorized(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some(LOGIN_PATH)
        );
        assert!(response.extensions().get::<CustomerTokenRejected>().is_some());
    }

    #[test]
    fn test_shopify_error_status_codes() {
        assert_eq!(
            AppError::from(ShopifyError::NotFound("x".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ShopifyError::UserError("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ShopifyError::RateLimited(3)).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::from(ShopifyError::graphql_message("boom")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(ShopifyError::OAuth("expired".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::from(ShopifyError::graphql_message("secret upstream detail"));
        assert_eq!(err.public_message(), "External service error");

        let err = AppError::from(ShopifyError::UserError("Quantity is invalid".to_string()));
        assert_eq!(err.public_message(), "Quantity is invalid");
    }
}
