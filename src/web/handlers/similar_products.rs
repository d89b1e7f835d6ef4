//! Similar products endpoint: `GET /product/:id/similar`

use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;

use crate::models::ProductDetail;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

/// Details of the products similar to `id`, in upstream order
///
/// Responds `200` with a possibly empty array. Responds `502` only when the
/// similar-ids lookup failed in a way that cannot degrade to an empty list.
///
/// The route needs a non-empty `:id` segment, so the empty id (valid for
/// [`SimilarProductsService`](crate::services::SimilarProductsService)) is
/// only reachable through the service, not over HTTP.
pub async fn get_similar_products(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Vec<ProductDetail>>> {
    debug!(product_id = %product_id, "GET similar products");
    let details = state.service.get_similar_products(&product_id).await?;
    Ok(Json(details))
}
