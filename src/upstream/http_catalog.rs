//! # HTTP Product Catalog
//!
//! `reqwest` implementation of [`ProductCatalog`] against the upstream
//! catalog service:
//!
//! - `GET {base_url}/product/{id}/similarids` → JSON array of ids
//! - `GET {base_url}/product/{id}` → `{id, name, price, availability}`
//!
//! HTTP 404 maps to `Ok(None)`. Every request is a single attempt.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::{ProductDetail, ProductId, SimilarIdList};
use crate::upstream::catalog::ProductCatalog;
use crate::upstream::errors::{UpstreamError, UpstreamResult};

/// Connection settings for the upstream catalog
///
/// # Examples
///
/// ```rust
/// use similar_products::upstream::HttpCatalogConfig;
///
/// let config = HttpCatalogConfig::default();
/// assert_eq!(config.base_url, "http://localhost:3001");
/// ```
#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    /// Base URL of the catalog service (e.g., "<http://localhost:3001>")
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Total time allowed for one request, body included
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for HttpCatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(8),
            pool_max_idle_per_host: 200,
            pool_idle_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the upstream catalog
#[derive(Clone)]
pub struct HttpProductCatalog {
    client: Client,
    config: HttpCatalogConfig,
    base_url: Url,
}

impl std::fmt::Debug for HttpProductCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProductCatalog")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.config.request_timeout)
            .finish()
    }
}

impl HttpProductCatalog {
    /// Create a catalog client, validating the base URL
    pub fn new(config: HttpCatalogConfig) -> UpstreamResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(UpstreamError::InvalidUrl(format!(
                "{}: expected an http(s) base URL",
                config.base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(format!("similar-products/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                UpstreamError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            base_url = %config.base_url,
            connect_timeout_ms = config.connect_timeout.as_millis(),
            request_timeout_ms = config.request_timeout.as_millis(),
            "Created upstream catalog client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// `{base}/product/{id}[/{suffix}]`, with `id` encoded as one path segment
    ///
    /// `.` and `..` have no URL form: URL parsing treats them, and their
    /// percent-encoded spellings, as dot segments and removes them.
    fn product_url(&self, id: &ProductId, suffix: Option<&str>) -> UpstreamResult<Url> {
        if is_dot_segment(id) {
            return Err(UpstreamError::InvalidUrl(format!(
                "product id {:?} cannot be a path segment",
                id.as_str()
            )));
        }

        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| UpstreamError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push("product").push(id.as_str());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> UpstreamResult<Option<T>> {
        debug!(url = %url, "Calling upstream catalog");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Upstream answered 404");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UpstreamError::status(status.as_u16(), url.as_str()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, &e))?;

        serde_json::from_slice::<T>(&body)
            .map(Some)
            .map_err(|e| UpstreamError::decode(url.as_str(), e.to_string()))
    }
}

fn is_dot_segment(id: &ProductId) -> bool {
    matches!(id.as_str(), "." | "..")
}

fn transport_error(url: &Url, error: &reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::timeout(url.as_str(), error.to_string())
    } else {
        UpstreamError::transport(url.as_str(), error.to_string())
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn fetch_similar_ids(&self, id: &ProductId) -> UpstreamResult<Option<SimilarIdList>> {
        if is_dot_segment(id) {
            debug!(product_id = %id, "Product id is not addressable upstream");
            return Ok(None);
        }
        let url = self.product_url(id, Some("similarids"))?;
        self.get_json::<SimilarIdList>(url).await
    }

    async fn fetch_detail(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>> {
        if is_dot_segment(id) {
            debug!(product_id = %id, "Product id is not addressable upstream");
            return Ok(None);
        }
        let url = self.product_url(id, None)?;
        self.get_json::<ProductDetail>(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(base_url: &str) -> HttpProductCatalog {
        HttpProductCatalog::new(HttpCatalogConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_product_urls() {
        let catalog = catalog("http://localhost:3001");

        let detail = catalog.product_url(&ProductId::new("1"), None).unwrap();
        assert_eq!(detail.as_str(), "http://localhost:3001/product/1");

        let similar = catalog
            .product_url(&ProductId::new("1"), Some("similarids"))
            .unwrap();
        assert_eq!(similar.as_str(), "http://localhost:3001/product/1/similarids");
    }

    #[test]
    fn test_product_url_keeps_base_path() {
        let catalog = catalog("http://catalog.internal/api/");
        let url = catalog.product_url(&ProductId::new("7"), None).unwrap();
        assert_eq!(url.as_str(), "http://catalog.internal/api/product/7");
    }

    #[test]
    fn test_product_id_is_one_segment() {
        let catalog = catalog("http://localhost:3001");
        let url = catalog
            .product_url(&ProductId::new("a/b?c"), Some("similarids"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/product/a%2Fb%3Fc/similarids"
        );

        for id in [".", ".."] {
            let result = catalog.product_url(&ProductId::new(id), Some("similarids"));
            assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));
            let result = catalog.product_url(&ProductId::new(id), None);
            assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));
        }

        let url = catalog.product_url(&ProductId::new("..."), None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/product/...");
    }

    #[tokio::test]
    async fn test_dot_segment_ids_are_not_found_without_a_request() {
        // Nothing listens on this port; a request would surface as a transport error
        let catalog = catalog("http://127.0.0.1:9");

        for id in [".", ".."] {
            let id = ProductId::new(id);
            assert!(catalog.fetch_detail(&id).await.unwrap().is_none());
            assert!(catalog.fetch_similar_ids(&id).await.unwrap().is_none());
        }
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = HttpProductCatalog::new(HttpCatalogConfig {
            base_url: "mailto:catalog@example.com".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));

        let result = HttpProductCatalog::new(HttpCatalogConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));
    }
}
