// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid barrier context: {0}")]
    InvalidBarrier(String),

    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(i64),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Invalid order state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
