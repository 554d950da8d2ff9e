//! Checkout domain model.
//!
//! # Responsibility
//! - Define the customer, product and order entities used by repositories.
//! - Enforce entity invariants at construction and before every write.
//!
//! # Invariants
//! - Entities are identified by caller-provided string ids.
//! - Money values are integer minor currency units.

pub mod customer;
pub mod order;
pub mod product;
