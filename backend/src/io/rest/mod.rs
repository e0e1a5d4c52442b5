//! # REST API Interface Layer
//!
//! Thin HTTP translation over the domain services: JSON (de)serialization,
//! principal hand-off from the auth collaborator, and mapping domain error
//! kinds to status codes. No business logic lives here.

pub mod bank_apis;
pub mod donor_apis;
pub mod hospital_apis;
pub mod request_apis;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::domain::{DomainError, Principal};

/// Headers the auth collaborator uses to hand over the acting principal.
/// The backend trusts them verbatim; validating them is the collaborator's
/// job.
const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// Extract the acting principal, if the auth collaborator supplied one.
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let user_id = headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()?;
    let role = headers
        .get(USER_ROLE_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    Some(Principal { user_id, role })
}

/// Translate a domain failure into an HTTP response. Validation, missing
/// targets and conflicts surface their message; storage failures are logged
/// and surface as a generic error so no storage internals leak out.
pub fn domain_error_response(context: &str, err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        DomainError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
        DomainError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
        DomainError::Storage(source) => {
            error!("{}: {:?}", context, source);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Role;

    #[test]
    fn principal_parsed_from_trusted_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "42".parse().unwrap());
        headers.insert(USER_ROLE_HEADER, "donor".parse().unwrap());

        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.user_id, 42);
        assert_eq!(principal.role, Role::Donor);
    }

    #[test]
    fn missing_or_malformed_headers_mean_anonymous() {
        assert!(principal_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "not-a-number".parse().unwrap());
        headers.insert(USER_ROLE_HEADER, "donor".parse().unwrap());
        assert!(principal_from_headers(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "42".parse().unwrap());
        headers.insert(USER_ROLE_HEADER, "astronaut".parse().unwrap());
        assert!(principal_from_headers(&headers).is_none());
    }
}
