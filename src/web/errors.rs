//! # Web API Errors
//!
//! Maps service errors onto HTTP responses with a JSON body of the form
//! `{"error": CODE, "message": TEXT}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::SimilarProductsError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The upstream catalog could not provide the similar-ids list
    #[error(transparent)]
    Upstream(#[from] SimilarProductsError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Upstream(_) => "SIMILAR_PRODUCTS_RETRIEVAL_FAILED",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        match &self {
            ApiError::Upstream(SimilarProductsError::Retrieval { product_id, source }) => {
                error!(
                    product_id = %product_id,
                    error = %source,
                    "Similar products request failed"
                );
            }
        }

        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });

        (status_code, Json(body)).into_response()
    }
}
