use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::types::AccountId;

/// JWT authentication middleware for `/api/:account`.
///
/// The account path is parsed first, so a malformed account is a 400 whether
/// or not credentials were sent. The parsed `AccountId` and the verified
/// `Claims` are both injected as request extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    Path(raw_account): Path<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account: AccountId = raw_account.parse()?;

    let claims = {
        let token = extract_bearer_token(request.headers()).map_err(|reason| {
            tracing::debug!("Rejected credentials: {}", reason);
            ApiError::unauthorized()
        })?;
        state.verifier.verify(token)?
    };

    tracing::debug!("Authenticated subject '{}' with role '{}'", claims.subject, claims.role);
    request.extensions_mut().insert(account);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
/// Anything after the first whitespace-delimited token is ignored.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;

    let rest = auth_str
        .strip_prefix("Bearer")
        .ok_or("Authorization header must use Bearer token format")?;

    if !rest.starts_with(char::is_whitespace) {
        return Err("Authorization header must use Bearer token format");
    }

    rest.split_whitespace().next().ok_or("empty bearer token")
}
