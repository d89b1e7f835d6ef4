pub mod product;

pub use product::{ProductDetail, ProductId, SimilarIdList};
