//! Customer use-case service.
//!
//! # Invariants
//! - Reward points are granted as half of an order total, rounded down.

use crate::model::customer::Customer;
use crate::repo::customer_repo::CustomerRepository;
use crate::repo::RepoResult;

/// Use-case service wrapper for customer operations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_customer(&self, customer: &Customer) -> RepoResult<()> {
        self.repo.create(customer)
    }

    pub fn update_customer(&self, customer: &Customer) -> RepoResult<()> {
        self.repo.update(customer)
    }

    pub fn get_customer(&self, customer_id: &str) -> RepoResult<Option<Customer>> {
        self.repo.find(customer_id)
    }

    pub fn list_customers(&self) -> RepoResult<Vec<Customer>> {
        self.repo.find_all()
    }

    /// Grants reward points for a placed order and returns the stored customer.
    pub fn award_points(&self, customer_id: &str, order_total: i64) -> RepoResult<Customer> {
        self.repo
            .add_reward_points(customer_id, reward_points_for(order_total))
    }
}

/// Reward points earned by an order of `order_total`.
pub fn reward_points_for(order_total: i64) -> i64 {
    order_total.max(0) / 2
}
