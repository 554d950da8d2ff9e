//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `checkout_core` linkage and schema bootstrap from a shell.
//! - Print deterministic `key=value` lines for quick local sanity checks.
//!
//! Usage: `checkout_cli [DB_PATH]`. Without a path an in-memory store is used.

use checkout_core::db::{open_db, open_db_in_memory};
use checkout_core::{
    orders_total, CustomerRepository, OrderRepository, ProductRepository,
    SqliteCustomerRepository, SqliteOrderRepository, SqliteProductRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("checkout_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<String>) -> Result<(), Box<dyn Error>> {
    let conn = match db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    let customers = SqliteCustomerRepository::try_new(&conn)?.find_all()?;
    let products = SqliteProductRepository::try_new(&conn)?.find_all()?;
    let orders = SqliteOrderRepository::try_new(&conn)?.find_all()?;

    println!("checkout_core version={}", checkout_core::core_version());
    println!("customers={}", customers.len());
    println!("products={}", products.len());
    println!("orders={}", orders.len());
    match orders_total(&orders) {
        Some(total) => println!("orders_total={total}"),
        None => println!("orders_total=overflow"),
    }
    Ok(())
}
