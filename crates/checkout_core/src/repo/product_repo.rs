//! Product repository contracts and SQLite implementation.

use super::schema::{ensure_connection_ready, RequiredTable};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::product::Product;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRODUCT_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "products",
    columns: &["id", "name", "price"],
}];

pub trait ProductRepository {
    fn create(&self, product: &Product) -> RepoResult<()>;
    fn update(&self, product: &Product) -> RepoResult<()>;
    fn find(&self, product_id: &str) -> RepoResult<Option<Product>>;
    fn find_all(&self) -> RepoResult<Vec<Product>>;
}

pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, PRODUCT_TABLES)?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create(&self, product: &Product) -> RepoResult<()> {
        product.validate()?;
        self.conn.execute(
            "INSERT INTO products (id, name, price) VALUES (?1, ?2, ?3);",
            params![product.id, product.name, product.price],
        )?;
        Ok(())
    }

    fn update(&self, product: &Product) -> RepoResult<()> {
        product.validate()?;
        let changed = self.conn.execute(
            "UPDATE products SET name = ?2, price = ?3 WHERE id = ?1;",
            params![product.id, product.name, product.price],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Product, &product.id));
        }
        Ok(())
    }

    fn find(&self, product_id: &str) -> RepoResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                "SELECT id, name, price FROM products WHERE id = ?1;",
                [product_id],
                parse_product_row,
            )
            .optional()?;
        product.map(checked).transpose()
    }

    fn find_all(&self) -> RepoResult<Vec<Product>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, price FROM products ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(checked(parse_product_row(row)?)?);
        }
        Ok(products)
    }
}

fn parse_product_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        price: row.get("price")?,
    })
}

fn checked(product: Product) -> RepoResult<Product> {
    product.validate().map_err(|err| {
        RepoError::InvalidData(format!("product `{}` in products: {err}", product.id))
    })?;
    Ok(product)
}
