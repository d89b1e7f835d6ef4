//! # Web API Request Handlers

pub mod health;
pub mod similar_products;
