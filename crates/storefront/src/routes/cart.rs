//! Cart route handlers.
//!
//! The cart belongs to the logged-in user; there is no cart ID in the URL.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use qkart_core::validation::parse_quantity;
use qkart_core::{Cart, ProductId, Quantity, ValidationError};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::routes::ApiJson;
use crate::state::AppState;

/// Body of `POST /v1/cart` and `PUT /v1/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Return the user's cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let cart = state.carts().get_cart_by_user(&user.email).await?;
    Ok(Json(cart))
}

/// Add a product to the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<(StatusCode, Json<Cart>)> {
    let quantity = Quantity::try_from(body.quantity).map_err(ValidationError::from)?;

    let cart = state
        .carts()
        .add_product_to_cart(&user.email, body.product_id, quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[("product_id", body.product_id.to_string().as_str())]),
    );

    Ok((StatusCode::CREATED, Json(cart)))
}

/// Change a line item's quantity. Zero removes it and answers 204.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Response> {
    let change = parse_quantity(body.quantity)?;

    let updated = state
        .carts()
        .apply_quantity_change(&user.email, body.product_id, change)
        .await?;

    Ok(match updated {
        Some(cart) => Json(cart).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Pay for the cart from the wallet and empty it.
#[instrument(skip(state, requester), fields(user_id = %requester.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(requester): RequireAuth,
) -> Result<StatusCode> {
    let mut user = state.users().current(&requester).await?;

    state.carts().checkout(&mut user).await?;

    tracing::info!(wallet_money = %user.wallet_money, "Checkout complete");
    add_breadcrumb("cart", "Checked out", None);

    Ok(StatusCode::NO_CONTENT)
}
