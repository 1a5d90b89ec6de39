//! Executor configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Fixed order quantity in base units.
    #[serde(default = "default_order_quantity")]
    pub order_quantity: Decimal,
    /// Depth requested for the pre-trade book check.
    #[serde(default = "default_book_depth")]
    pub book_depth: u32,
}

fn default_order_quantity() -> Decimal {
    Decimal::from(100)
}

fn default_book_depth() -> u32 {
    20
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            order_quantity: default_order_quantity(),
            book_depth: default_book_depth(),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.order_quantity <= Decimal::ZERO {
            return Err(format!(
                "executor.order_quantity must be positive (got {})",
                self.order_quantity
            ));
        }
        if self.book_depth == 0 {
            return Err("executor.book_depth must be positive".to_string());
        }
        Ok(())
    }
}
