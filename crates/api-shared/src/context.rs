//! Trusted session context.
//!
//! The core trusts the authenticated-session layer in front of it to
//! supply the caller's facility and user identifiers; session issuance and
//! verification are out of scope here. Handlers receive the context via an
//! axum extractor reading the two headers that layer sets.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use lst_core::FacilityId;
use uuid::Uuid;

/// Header carrying the caller's facility (tenant) id.
pub const FACILITY_HEADER: &str = "x-facility-id";

/// Header carrying the caller's user id, when known.
pub const USER_HEADER: &str = "x-user-id";

/// The caller's tenant scope, resolved per request.
#[derive(Clone, Copy, Debug)]
pub struct FacilityContext {
    pub facility_id: FacilityId,
    pub user_id: Option<Uuid>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for FacilityContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(FACILITY_HEADER)
            .ok_or((StatusCode::UNAUTHORIZED, "Missing x-facility-id header"))?
            .to_str()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid x-facility-id header"))?;
        let facility_id = Uuid::parse_str(raw)
            .map(FacilityId::new)
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid x-facility-id header"))?;

        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());

        Ok(FacilityContext {
            facility_id,
            user_id,
        })
    }
}
