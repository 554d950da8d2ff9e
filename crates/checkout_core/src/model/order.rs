//! Order aggregate and its line items.
//!
//! # Responsibility
//! - Define the checkout `Order` aggregate and owned `OrderItem` lines.
//! - Derive the order total from line subtotals.
//!
//! # Invariants
//! - `Order::total()` is always recomputable from `items`.
//! - Item ids are unique within one order.
//! - `price > 0` and `quantity >= 1` for every item.
//! - An order carries at least one item.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable order identifier.
pub type OrderId = String;

/// Validation errors for order aggregate invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    EmptyOrderId,
    EmptyCustomerId,
    NoItems,
    EmptyItemId,
    EmptyItemName(String),
    EmptyProductId(String),
    NonPositivePrice { item_id: String, price: i64 },
    NonPositiveQuantity { item_id: String, quantity: i64 },
    DuplicateItemId(String),
    TotalOverflow,
}

impl Display for OrderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOrderId => write!(f, "order id is required"),
            Self::EmptyCustomerId => write!(f, "customer id is required"),
            Self::NoItems => write!(f, "order must contain at least one item"),
            Self::EmptyItemId => write!(f, "item id is required"),
            Self::EmptyItemName(id) => write!(f, "item `{id}` name is required"),
            Self::EmptyProductId(id) => write!(f, "item `{id}` product id is required"),
            Self::NonPositivePrice { item_id, price } => {
                write!(f, "item `{item_id}` price must be greater than 0, got {price}")
            }
            Self::NonPositiveQuantity { item_id, quantity } => write!(
                f,
                "item `{item_id}` quantity must be greater than 0, got {quantity}"
            ),
            Self::DuplicateItemId(id) => write!(f, "item id `{id}` appears more than once"),
            Self::TotalOverflow => write!(f, "order total overflows i64"),
        }
    }
}

impl Error for OrderValidationError {}

/// One order line. Has no lifecycle outside its parent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique within the parent order's item set.
    pub id: String,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub product_id: String,
    pub quantity: i64,
}

impl OrderItem {
    /// Creates a validated order line.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: i64,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> Result<Self, OrderValidationError> {
        let item = Self {
            id: id.into(),
            name: name.into(),
            price,
            product_id: product_id.into(),
            quantity,
        };
        item.validate()?;
        Ok(item)
    }

    /// Returns `price * quantity`, or `None` on overflow.
    pub fn checked_subtotal(&self) -> Option<i64> {
        self.price.checked_mul(self.quantity)
    }

    /// Returns `price * quantity`.
    ///
    /// Saturates instead of wrapping; validated items never get there.
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(self.quantity)
    }

    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.id.trim().is_empty() {
            return Err(OrderValidationError::EmptyItemId);
        }
        if self.name.trim().is_empty() {
            return Err(OrderValidationError::EmptyItemName(self.id.clone()));
        }
        if self.product_id.trim().is_empty() {
            return Err(OrderValidationError::EmptyProductId(self.id.clone()));
        }
        if self.price <= 0 {
            return Err(OrderValidationError::NonPositivePrice {
                item_id: self.id.clone(),
                price: self.price,
            });
        }
        if self.quantity <= 0 {
            return Err(OrderValidationError::NonPositiveQuantity {
                item_id: self.id.clone(),
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// Checkout order aggregate.
///
/// `total` is not a field: it is derived from `items` on demand and only
/// denormalized in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    /// Insertion order is preserved through persistence.
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates a validated order.
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderValidationError> {
        let order = Self {
            id: id.into(),
            customer_id: customer_id.into(),
            items,
        };
        order.validate()?;
        Ok(order)
    }

    /// Sum of all item subtotals.
    pub fn total(&self) -> i64 {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Reassigns the order to another customer.
    pub fn change_customer(
        &mut self,
        customer_id: impl Into<String>,
    ) -> Result<(), OrderValidationError> {
        let customer_id = customer_id.into();
        if customer_id.trim().is_empty() {
            return Err(OrderValidationError::EmptyCustomerId);
        }
        self.customer_id = customer_id;
        Ok(())
    }

    /// Replaces the whole item set. The order is left unchanged on error.
    pub fn replace_items(&mut self, items: Vec<OrderItem>) -> Result<(), OrderValidationError> {
        validate_items(&items)?;
        self.items = items;
        Ok(())
    }

    /// Appends one item. The order is left unchanged on error.
    pub fn add_item(&mut self, item: OrderItem) -> Result<(), OrderValidationError> {
        item.validate()?;
        if self.items.iter().any(|existing| existing.id == item.id) {
            return Err(OrderValidationError::DuplicateItemId(item.id));
        }
        self.items.push(item);
        validate_total(&self.items).inspect_err(|_| {
            self.items.pop();
        })
    }

    /// Looks up one item by id.
    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Checks all aggregate invariants.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.id.trim().is_empty() {
            return Err(OrderValidationError::EmptyOrderId);
        }
        if self.customer_id.trim().is_empty() {
            return Err(OrderValidationError::EmptyCustomerId);
        }
        validate_items(&self.items)
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderValidationError> {
    if items.is_empty() {
        return Err(OrderValidationError::NoItems);
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        item.validate()?;
        if !seen.insert(item.id.as_str()) {
            return Err(OrderValidationError::DuplicateItemId(item.id.clone()));
        }
    }

    validate_total(items)
}

fn validate_total(items: &[OrderItem]) -> Result<(), OrderValidationError> {
    items
        .iter()
        .try_fold(0_i64, |acc, item| {
            item.checked_subtotal()
                .and_then(|subtotal| acc.checked_add(subtotal))
        })
        .map(|_| ())
        .ok_or(OrderValidationError::TotalOverflow)
}
