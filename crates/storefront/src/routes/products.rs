//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use qkart_core::{Product, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// List the catalog.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list().await?;
    Ok(Json(products))
}

/// Show a single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .find_by_id(product_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product with id {product_id} not found")))
}
