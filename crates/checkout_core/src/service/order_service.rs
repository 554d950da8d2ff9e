//! Order use-case service.
//!
//! # Responsibility
//! - Provide order entry points for core callers.
//! - Place new orders with generated stable ids.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::order::{Order, OrderId, OrderItem, OrderValidationError};
use crate::repo::order_repo::OrderRepository;
use crate::repo::{EntityKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for order use-cases.
#[derive(Debug)]
pub enum OrderServiceError {
    /// Input does not form a valid order.
    InvalidOrder(OrderValidationError),
    /// Target order does not exist.
    OrderNotFound(OrderId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for OrderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrder(err) => write!(f, "{err}"),
            Self::OrderNotFound(id) => write!(f, "order not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent order state: {details}"),
        }
    }
}

impl Error for OrderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidOrder(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for OrderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                kind: EntityKind::Order,
                id,
            } => Self::OrderNotFound(id),
            RepoError::InvalidOrder(err) => Self::InvalidOrder(err),
            other => Self::Repo(other),
        }
    }
}

impl From<OrderValidationError> for OrderServiceError {
    fn from(value: OrderValidationError) -> Self {
        Self::InvalidOrder(value)
    }
}

/// Order service facade over repository implementations.
pub struct OrderService<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_order(&self, order: &Order) -> Result<(), OrderServiceError> {
        Ok(self.repo.create(order)?)
    }

    /// Builds an order with a generated UUID v4 id and persists it.
    ///
    /// Returns the order as read back from storage.
    pub fn place_order(
        &self,
        customer_id: impl Into<String>,
        items: Vec<OrderItem>,
    ) -> Result<Order, OrderServiceError> {
        let order = Order::new(Uuid::new_v4().to_string(), customer_id, items)?;
        self.repo.create(&order)?;
        self.repo
            .find(&order.id)?
            .ok_or(OrderServiceError::InconsistentState(
                "placed order not found in read-back",
            ))
    }

    /// Reconciles the stored order with `order`.
    ///
    /// Returns `OrderNotFound` unchanged when the id is not stored.
    pub fn update_order(&self, order: &Order) -> Result<(), OrderServiceError> {
        Ok(self.repo.update(order)?)
    }

    pub fn get_order(&self, order_id: &str) -> Result<Option<Order>, OrderServiceError> {
        Ok(self.repo.find(order_id)?)
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, OrderServiceError> {
        Ok(self.repo.find_all()?)
    }
}

/// Sums the totals of `orders`, or `None` when the sum leaves `i64`.
pub fn orders_total(orders: &[Order]) -> Option<i64> {
    orders
        .iter()
        .try_fold(0_i64, |sum, order| sum.checked_add(order.total()))
}
