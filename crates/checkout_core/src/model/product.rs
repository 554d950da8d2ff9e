//! Catalog product entity.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ProductId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    EmptyId,
    EmptyName,
    NonPositivePrice(i64),
}

impl Display for ProductValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "product id is required"),
            Self::EmptyName => write!(f, "product name is required"),
            Self::NonPositivePrice(price) => {
                write!(f, "product price must be greater than 0, got {price}")
            }
        }
    }
}

impl Error for ProductValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: i64,
    ) -> Result<Self, ProductValidationError> {
        let product = Self {
            id: id.into(),
            name: name.into(),
            price,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn change_name(&mut self, name: impl Into<String>) -> Result<(), ProductValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    pub fn change_price(&mut self, price: i64) -> Result<(), ProductValidationError> {
        if price <= 0 {
            return Err(ProductValidationError::NonPositivePrice(price));
        }
        self.price = price;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.id.trim().is_empty() {
            return Err(ProductValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        if self.price <= 0 {
            return Err(ProductValidationError::NonPositivePrice(self.price));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Product, ProductValidationError};

    #[test]
    fn change_price_keeps_old_value_on_error() {
        let mut product = Product::new("p1", "Product 1", 10).unwrap();
        assert_eq!(
            product.change_price(-1).unwrap_err(),
            ProductValidationError::NonPositivePrice(-1)
        );
        assert_eq!(product.price, 10);
    }
}
