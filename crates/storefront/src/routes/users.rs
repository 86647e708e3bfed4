//! User profile route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use qkart_core::UserId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::ApiJson;
use crate::state::AppState;

/// Query parameters for `GET /v1/users/{userId}`.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    /// `address` narrows the response to the shipping address.
    pub q: Option<String>,
}

/// Address request and response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressBody {
    pub address: String,
}

/// Return the user's own profile, or just the address with `?q=address`.
#[instrument(skip(state, requester), fields(requester = %requester.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(requester): RequireAuth,
    Path(user_id): Path<UserId>,
    Query(query): Query<ShowQuery>,
) -> Result<Response> {
    let user = state.users().get_user(&requester, user_id).await?;

    if query.q.as_deref() == Some("address") {
        return Ok(Json(AddressBody {
            address: user.address,
        })
        .into_response());
    }

    Ok(Json(user).into_response())
}

/// Set the user's shipping address.
#[instrument(skip(state, requester, body), fields(requester = %requester.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(requester): RequireAuth,
    Path(user_id): Path<UserId>,
    ApiJson(body): ApiJson<AddressBody>,
) -> Result<Json<AddressBody>> {
    let address = state
        .users()
        .set_address(&requester, user_id, &body.address)
        .await?;

    Ok(Json(AddressBody { address }))
}
