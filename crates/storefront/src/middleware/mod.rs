//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP with the per-request nonce, framing, isolation)
//! 5. CSP nonce (generate per-request nonce for inline scripts)
//! 6. Session layer (tower-sessions with in-memory store)
//! 7. Customer token rejection (signs out customers whose token Shopify rejects)
//! 8. Rate limiting (governor, auth routes only)
//!
//! Extractors: [`PageContext`], [`RequireCustomer`], [`OptionalCustomer`], [`CspNonce`].

pub mod csp;
pub mod customer;
pub mod page;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use customer::{
    OptionalCustomer, RequireCustomer, clear_customer_token, customer_token_rejection_middleware,
    set_customer_token,
};
pub use page::PageContext;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
