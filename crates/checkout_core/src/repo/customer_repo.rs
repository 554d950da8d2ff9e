//! Customer repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Address columns are either all set or all NULL.
//! - Persisted rows are re-validated on read.
//! - Reward points grow through one SQL increment, never read-modify-write,
//!   so concurrent awards on separate connections all land.

use super::schema::{ensure_connection_ready, RequiredTable};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::customer::{Address, Customer};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const CUSTOMER_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "customers",
    columns: &[
        "id",
        "name",
        "street",
        "number",
        "zip",
        "city",
        "active",
        "reward_points",
    ],
}];

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    name,
    street,
    number,
    zip,
    city,
    active,
    reward_points
FROM customers";

pub trait CustomerRepository {
    fn create(&self, customer: &Customer) -> RepoResult<()>;
    fn update(&self, customer: &Customer) -> RepoResult<()>;
    fn find(&self, customer_id: &str) -> RepoResult<Option<Customer>>;
    fn find_all(&self) -> RepoResult<Vec<Customer>>;
    /// Adds `points` to the stored balance and returns the updated customer.
    /// Non-positive `points` leave the balance unchanged.
    fn add_reward_points(&self, customer_id: &str, points: i64) -> RepoResult<Customer>;
}

pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, CUSTOMER_TABLES)?;
        Ok(Self { conn })
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn create(&self, customer: &Customer) -> RepoResult<()> {
        customer.validate()?;
        let address = customer.address.as_ref();

        self.conn.execute(
            "INSERT INTO customers (
                id,
                name,
                street,
                number,
                zip,
                city,
                active,
                reward_points
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                customer.id,
                customer.name,
                address.map(|value| value.street.as_str()),
                address.map(|value| value.number),
                address.map(|value| value.zip.as_str()),
                address.map(|value| value.city.as_str()),
                customer.active,
                customer.reward_points,
            ],
        )?;
        Ok(())
    }

    fn update(&self, customer: &Customer) -> RepoResult<()> {
        customer.validate()?;
        let address = customer.address.as_ref();

        let changed = self.conn.execute(
            "UPDATE customers
             SET
                name = ?2,
                street = ?3,
                number = ?4,
                zip = ?5,
                city = ?6,
                active = ?7,
                reward_points = ?8
             WHERE id = ?1;",
            params![
                customer.id,
                customer.name,
                address.map(|value| value.street.as_str()),
                address.map(|value| value.number),
                address.map(|value| value.zip.as_str()),
                address.map(|value| value.city.as_str()),
                customer.active,
                customer.reward_points,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Customer, &customer.id));
        }
        Ok(())
    }

    fn find(&self, customer_id: &str) -> RepoResult<Option<Customer>> {
        select_customer(self.conn, customer_id)
    }

    fn find_all(&self) -> RepoResult<Vec<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(CustomerRow::from_row(row)?.into_customer()?);
        }
        Ok(customers)
    }

    fn add_reward_points(&self, customer_id: &str, points: i64) -> RepoResult<Customer> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE customers
             SET reward_points = CASE
                WHEN reward_points > 9223372036854775807 - ?2 THEN 9223372036854775807
                ELSE reward_points + ?2
             END
             WHERE id = ?1;",
            params![customer_id, points.max(0)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Customer, customer_id));
        }

        let customer = select_customer(&tx, customer_id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Customer, customer_id))?;
        tx.commit()?;
        Ok(customer)
    }
}

fn select_customer(conn: &Connection, customer_id: &str) -> RepoResult<Option<Customer>> {
    let row = conn
        .query_row(
            &format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"),
            [customer_id],
            CustomerRow::from_row,
        )
        .optional()?;
    row.map(CustomerRow::into_customer).transpose()
}

struct CustomerRow {
    id: String,
    name: String,
    street: Option<String>,
    number: Option<i64>,
    zip: Option<String>,
    city: Option<String>,
    active: bool,
    reward_points: i64,
}

impl CustomerRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            street: row.get("street")?,
            number: row.get("number")?,
            zip: row.get("zip")?,
            city: row.get("city")?,
            active: row.get("active")?,
            reward_points: row.get("reward_points")?,
        })
    }

    fn into_customer(self) -> RepoResult<Customer> {
        let address = match (self.street, self.number, self.zip, self.city) {
            (Some(street), Some(number), Some(zip), Some(city)) => Some(Address {
                street,
                number,
                zip,
                city,
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(RepoError::InvalidData(format!(
                    "customer `{}` has a partial address in customers",
                    self.id
                )));
            }
        };

        let customer = Customer {
            id: self.id,
            name: self.name,
            address,
            active: self.active,
            reward_points: self.reward_points,
        };
        customer.validate().map_err(|err| {
            RepoError::InvalidData(format!("customer `{}` in customers: {err}", customer.id))
        })?;
        Ok(customer)
    }
}
