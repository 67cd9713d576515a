//! Customer identity extraction.
//!
//! Token issuance and verification are the auth subsystem's job; by the
//! time a request reaches this core, the gateway in front has resolved the
//! session into an `x-customer-id` header carrying the verified customer
//! UUID.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::CustomerId;
use uuid::Uuid;

use crate::error::ApiError;

const CUSTOMER_HEADER: &str = "x-customer-id";

/// The verified customer behind the request.
pub struct CustomerIdentity(pub CustomerId);

impl<S> FromRequestParts<S> for CustomerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CUSTOMER_HEADER)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("missing {CUSTOMER_HEADER} header"))
            })?;

        let uuid = Uuid::parse_str(value)
            .map_err(|e| ApiError::Unauthorized(format!("invalid customer identity: {e}")))?;

        Ok(CustomerIdentity(CustomerId::from_uuid(uuid)))
    }
}
