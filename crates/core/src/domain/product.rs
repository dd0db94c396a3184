// Product Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Product ID (database row id)
pub type ProductId = i64;

/// Product Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub stock: i64,
    pub amount: i64, // unit price in cents
    pub created_at: i64, // epoch ms
    pub updated_at: i64,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, stock: i64, amount: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            stock,
            amount,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Take `num` units out of stock, refusing to go negative.
    pub fn decrease_stock(&mut self, num: i64) -> Result<()> {
        check_quantity(num)?;
        if self.stock < num {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
                requested: num,
            });
        }
        self.stock -= num;
        Ok(())
    }

    /// Put `num` units back into stock.
    pub fn increase_stock(&mut self, num: i64) -> Result<()> {
        check_quantity(num)?;
        self.stock = self
            .stock
            .checked_add(num)
            .ok_or(DomainError::InvalidQuantity(num))?;
        Ok(())
    }
}

fn check_quantity(num: i64) -> Result<()> {
    if num <= 0 {
        return Err(DomainError::InvalidQuantity(num));
    }
    Ok(())
}
