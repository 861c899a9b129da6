use axum::{
    body::Bytes,
    extract::{Extension, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::collections::HashMap;

use super::AppState;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::ledger::{Page, TransactionRequest};
use crate::types::{Access, AccountId};

// `AccountId` and `Claims` are placed by `jwt_auth_middleware`.

/// GET /api/:account?p={page} - balance plus one page of history, newest first
pub async fn account_get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Extension(account): Extension<AccountId>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    state.guard.authorize(&claims, account, Access::Read)?;

    let page = Page::from_query(query.get("p").map(String::as_str));
    let view = state.reader.load_account(account, page).await?;

    Ok(([(header::CACHE_CONTROL, "no-store, no-cache")], Json(view)).into_response())
}

/// POST /api/:account - post `{amount, desc}` as one atomic transaction
pub async fn account_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Extension(account): Extension<AccountId>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    state.guard.authorize(&claims, account, Access::Write)?;

    let request = TransactionRequest::from_body(&body)?;
    state
        .writer
        .post_transaction(account, &claims.subject, request.amount, &request.description)
        .await?;

    Ok(StatusCode::OK)
}
