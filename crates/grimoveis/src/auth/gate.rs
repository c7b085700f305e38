use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::token::TokenAuthority;
use crate::error::ApiError;

#[derive(Debug, PartialEq, Eq)]
enum PresentedToken<'a> {
    Missing,
    Malformed,
    Bearer(&'a str),
}

fn presented_token(headers: &HeaderMap) -> PresentedToken<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return PresentedToken::Missing;
    };
    let Ok(value) = value.to_str() else {
        return PresentedToken::Malformed;
    };

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            PresentedToken::Bearer(token)
        }
        (Some(_), Some(_)) => PresentedToken::Malformed,
        _ => PresentedToken::Missing,
    }
}

/// Middleware for mutating routes.
///
/// On success the decoded [`AuthenticatedUser`](super::AuthenticatedUser) is
/// placed in the request extensions. No header (or no token after the scheme)
/// is a 401; anything else that fails verification is a 403.
pub async fn require_bearer(
    State(tokens): State<TokenAuthority>,
    mut request: Request,
    next: Next,
) -> Response {
    let verdict = match presented_token(request.headers()) {
        PresentedToken::Missing => {
            debug!(path = %request.uri().path(), "bearer token missing");
            return ApiError::MissingToken.into_response();
        }
        PresentedToken::Malformed => {
            warn!(path = %request.uri().path(), "authorization header is not a bearer token");
            return ApiError::Forbidden.into_response();
        }
        PresentedToken::Bearer(token) => tokens.verify(token),
    };

    match verdict {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, path = %request.uri().path(), "bearer token rejected");
            ApiError::Forbidden.into_response()
        }
    }
}
