//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must validate the entity before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidData`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::customer::CustomerValidationError;
use crate::model::order::OrderValidationError;
use crate::model::product::ProductValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod customer_repo;
pub mod order_repo;
pub mod product_repo;
mod schema;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kind named by `RepoError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Customer,
    Product,
    Order,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Customer => "customer",
            Self::Product => "product",
            Self::Order => "order",
        };
        f.write_str(name)
    }
}

/// Error shared by all checkout repositories.
#[derive(Debug)]
pub enum RepoError {
    InvalidOrder(OrderValidationError),
    InvalidCustomer(CustomerValidationError),
    InvalidProduct(ProductValidationError),
    /// Transport or constraint failure reported by SQLite.
    Db(DbError),
    NotFound { kind: EntityKind, id: String },
    /// Persisted rows cannot be turned back into a valid entity.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns `true` for primary key, unique, foreign key and check failures.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrder(err) => write!(f, "{err}"),
            Self::InvalidCustomer(err) => write!(f, "{err}"),
            Self::InvalidProduct(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidOrder(err) => Some(err),
            Self::InvalidCustomer(err) => Some(err),
            Self::InvalidProduct(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<OrderValidationError> for RepoError {
    fn from(value: OrderValidationError) -> Self {
        Self::InvalidOrder(value)
    }
}

impl From<CustomerValidationError> for RepoError {
    fn from(value: CustomerValidationError) -> Self {
        Self::InvalidCustomer(value)
    }
}

impl From<ProductValidationError> for RepoError {
    fn from(value: ProductValidationError) -> Self {
        Self::InvalidProduct(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
