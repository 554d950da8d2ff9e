//! Checkout persistence core.
//! Owns the order/customer/product model and its SQLite repositories.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::{Address, Customer, CustomerId, CustomerValidationError};
pub use model::order::{Order, OrderId, OrderItem, OrderValidationError};
pub use model::product::{Product, ProductId, ProductValidationError};
pub use repo::customer_repo::{CustomerRepository, SqliteCustomerRepository};
pub use repo::order_repo::{
    plan_item_changes, ItemChangePlan, OrderRepository, SqliteOrderRepository,
};
pub use repo::product_repo::{ProductRepository, SqliteProductRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::customer_service::{reward_points_for, CustomerService};
pub use service::order_service::{orders_total, OrderService, OrderServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
