//! Tenant context extractor.
//!
//! Every ATS and directory route runs inside a tenant (`client_id`). Isolation
//! is equality filtering in the repositories; this extractor only carries the id.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// The tenant the current request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub client_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Validation(format!("{CLIENT_ID_HEADER} must be ASCII")))?;

        let client_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Validation(format!("{CLIENT_ID_HEADER} must be a UUID")))?;

        Ok(TenantContext { client_id })
    }
}
