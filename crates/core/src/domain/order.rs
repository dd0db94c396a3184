// Order Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Order ID (database row id)
pub type OrderId = i64;

/// Order Status
///
/// Stored as an integer column; `Reverted` keeps the value 9 that existing
/// order tables already use for invalidated orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Shipped,
    Completed,
    Reverted,
}

impl OrderStatus {
    pub fn code(self) -> i64 {
        match self {
            OrderStatus::Created => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Reverted => 9,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(OrderStatus::Created),
            1 => Ok(OrderStatus::Paid),
            2 => Ok(OrderStatus::Shipped),
            3 => Ok(OrderStatus::Completed),
            9 => Ok(OrderStatus::Reverted),
            other => Err(DomainError::UnknownOrderStatus(other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Created => write!(f, "CREATED"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Shipped => write!(f, "SHIPPED"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Reverted => write!(f, "REVERTED"),
        }
    }
}

/// Order Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub uid: i64,
    pub pid: i64,
    pub amount: i64,
    pub status: OrderStatus,
    pub created_at: i64, // epoch ms
    pub updated_at: i64,
}

impl Order {
    /// New order awaiting insert (id assigned by the store)
    pub fn new(uid: i64, pid: i64, amount: i64) -> Self {
        Self {
            id: 0,
            uid,
            pid,
            amount,
            status: OrderStatus::Created,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Mark the order invalid. Reverting twice is a no-op.
    pub fn revert(&mut self) -> Result<()> {
        if self.status == OrderStatus::Completed {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: OrderStatus::Reverted.to_string(),
            });
        }
        self.status = OrderStatus::Reverted;
        Ok(())
    }
}
