//! # Product Model
//!
//! Catalog records handled by the aggregation pipeline.
//!
//! ## Overview
//!
//! - `ProductId`: opaque identifier. Equality is exact string equality and the
//!   empty string is a valid, distinct id.
//! - `ProductDetail`: immutable detail record produced by a successful upstream
//!   fetch. The wire shape is `{id, name, price, availability}`.
//! - `SimilarIdList`: related ids in the order the upstream returned them,
//!   duplicates included.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Ordered list of related product ids as returned by the upstream catalog
pub type SimilarIdList = Vec<ProductId>;

/// Resolved product detail
///
/// Fields are private so a detail cannot change after it has been fetched;
/// use the accessors to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    id: ProductId,
    name: Option<String>,
    price: f64,
    #[serde(rename = "availability")]
    available: bool,
}

impl ProductDetail {
    pub fn new(id: impl Into<ProductId>, name: Option<String>, price: f64, available: bool) -> Self {
        Self {
            id: id.into(),
            name,
            price,
            available,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}
