//! Order repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Translate between the `Order` aggregate and `orders`/`order_items` rows.
//! - Reconcile stored line items against an incoming item set on update.
//!
//! # Invariants
//! - After any successful write the stored item set equals the aggregate's
//!   item set and `orders.total` equals `Order::total()`.
//! - Writes run in one IMMEDIATE transaction; a failed write leaves no trace.
//! - Reads run in one DEFERRED transaction, so an order and its items come
//!   from the same snapshot even while another connection writes.
//! - Read paths reject inconsistent persisted state instead of masking it.

use super::schema::{ensure_connection_ready, RequiredTable};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::order::{Order, OrderItem};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

const ORDER_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "orders",
        columns: &["id", "customer_id", "total"],
    },
    RequiredTable {
        name: "order_items",
        columns: &[
            "order_id",
            "id",
            "name",
            "price",
            "product_id",
            "quantity",
            "position",
        ],
    },
];

const ITEM_SELECT_SQL: &str = "SELECT
    order_id,
    id,
    name,
    price,
    product_id,
    quantity
FROM order_items";

/// Repository interface for order persistence.
pub trait OrderRepository {
    /// Inserts one order together with all of its items.
    ///
    /// Fails with a constraint violation when `order.id` is already stored.
    fn create(&self, order: &Order) -> RepoResult<()>;
    /// Rewrites customer, total and the full item set of a stored order.
    fn update(&self, order: &Order) -> RepoResult<()>;
    /// Loads one order with its items. Absence is `Ok(None)`.
    fn find(&self, order_id: &str) -> RepoResult<Option<Order>>;
    /// Loads every stored order with its items, sorted by order id.
    fn find_all(&self) -> RepoResult<Vec<Order>>;
}

/// Row-level changes needed to turn the stored item set into the incoming one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChangePlan<'a> {
    /// Incoming items whose id is already stored, with their target position.
    pub update: Vec<(usize, &'a OrderItem)>,
    /// Incoming items with no stored counterpart, with their target position.
    pub insert: Vec<(usize, &'a OrderItem)>,
    /// Stored item ids absent from the incoming set.
    pub delete: Vec<String>,
}

/// Diffs stored item ids against the incoming item set.
///
/// Deletions keep the order of `existing_ids`; updates and inserts keep the
/// order of `incoming`.
pub fn plan_item_changes<'a>(
    existing_ids: &[String],
    incoming: &'a [OrderItem],
) -> ItemChangePlan<'a> {
    let existing: HashSet<&str> = existing_ids.iter().map(String::as_str).collect();
    let incoming_ids: HashSet<&str> = incoming.iter().map(|item| item.id.as_str()).collect();

    let mut plan = ItemChangePlan::default();
    for (position, item) in incoming.iter().enumerate() {
        if existing.contains(item.id.as_str()) {
            plan.update.push((position, item));
        } else {
            plan.insert.push((position, item));
        }
    }
    plan.delete = existing_ids
        .iter()
        .filter(|id| !incoming_ids.contains(id.as_str()))
        .cloned()
        .collect();
    plan
}

/// SQLite-backed order repository.
pub struct SqliteOrderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ORDER_TABLES)?;
        Ok(Self { conn })
    }

    fn create_in_tx(&self, order: &Order) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO orders (id, customer_id, total) VALUES (?1, ?2, ?3);",
            params![order.id, order.customer_id, order.total()],
        )?;
        for (position, item) in order.items.iter().enumerate() {
            insert_item(&tx, &order.id, position, item)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_in_tx(&self, order: &Order) -> RepoResult<ItemChangeCounts> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE orders SET customer_id = ?2, total = ?3 WHERE id = ?1;",
            params![order.id, order.customer_id, order.total()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Order, &order.id));
        }

        let existing_ids = load_item_ids(&tx, &order.id)?;
        let plan = plan_item_changes(&existing_ids, &order.items);

        for &(position, item) in &plan.update {
            tx.execute(
                "UPDATE order_items
                 SET
                    name = ?3,
                    price = ?4,
                    product_id = ?5,
                    quantity = ?6,
                    position = ?7
                 WHERE order_id = ?1
                   AND id = ?2;",
                params![
                    order.id,
                    item.id,
                    item.name,
                    item.price,
                    item.product_id,
                    item.quantity,
                    position as i64,
                ],
            )?;
        }
        for &(position, item) in &plan.insert {
            insert_item(&tx, &order.id, position, item)?;
        }
        for item_id in &plan.delete {
            tx.execute(
                "DELETE FROM order_items WHERE order_id = ?1 AND id = ?2;",
                params![order.id, item_id],
            )?;
        }

        tx.commit()?;
        Ok(ItemChangeCounts {
            inserted: plan.insert.len(),
            updated: plan.update.len(),
            deleted: plan.delete.len(),
        })
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn create(&self, order: &Order) -> RepoResult<()> {
        order.validate()?;

        let started_at = Instant::now();
        match self.create_in_tx(order) {
            Ok(()) => {
                info!(
                    "event=order_create module=repo status=ok order_id={} items={} duration_ms={}",
                    order.id,
                    order.items.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=order_create module=repo status=error order_id={} duration_ms={} error={}",
                    order.id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn update(&self, order: &Order) -> RepoResult<()> {
        order.validate()?;

        let started_at = Instant::now();
        match self.update_in_tx(order) {
            Ok(counts) => {
                info!(
                    "event=order_update module=repo status=ok order_id={} items_inserted={} items_updated={} items_deleted={} duration_ms={}",
                    order.id,
                    counts.inserted,
                    counts.updated,
                    counts.deleted,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=order_update module=repo status=error order_id={} duration_ms={} rolled_back=true error={}",
                    order.id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn find(&self, order_id: &str) -> RepoResult<Option<Order>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let order = read_order(&tx, order_id)?;
        tx.commit()?;
        Ok(order)
    }

    fn find_all(&self) -> RepoResult<Vec<Order>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let orders = read_all_orders(&tx)?;
        tx.commit()?;
        Ok(orders)
    }
}

#[derive(Debug, Clone, Copy)]
struct ItemChangeCounts {
    inserted: usize,
    updated: usize,
    deleted: usize,
}

struct OrderHeader {
    id: String,
    customer_id: String,
    total: i64,
}

/// Loads one order and its items. Callers run this inside one read
/// transaction so header and items come from the same snapshot.
fn read_order(conn: &Connection, order_id: &str) -> RepoResult<Option<Order>> {
    let header = conn
        .query_row(
            "SELECT id, customer_id, total FROM orders WHERE id = ?1;",
            [order_id],
            parse_order_header,
        )
        .optional()?;

    let Some(header) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "{ITEM_SELECT_SQL}
         WHERE order_id = ?1
         ORDER BY position ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([order_id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }

    assemble_order(header, items).map(Some)
}

/// Loads every order with its items. Same snapshot rule as `read_order`.
fn read_all_orders(conn: &Connection) -> RepoResult<Vec<Order>> {
    let mut headers = Vec::new();
    {
        let mut stmt =
            conn.prepare("SELECT id, customer_id, total FROM orders ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            headers.push(parse_order_header(row)?);
        }
    }

    let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    let mut stmt = conn.prepare(&format!(
        "{ITEM_SELECT_SQL} ORDER BY order_id ASC, position ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let order_id: String = row.get("order_id")?;
        items_by_order
            .entry(order_id)
            .or_default()
            .push(parse_item_row(row)?);
    }

    headers
        .into_iter()
        .map(|header| {
            let items = items_by_order.remove(&header.id).unwrap_or_default();
            assemble_order(header, items)
        })
        .collect()
}

fn insert_item(
    tx: &Transaction<'_>,
    order_id: &str,
    position: usize,
    item: &OrderItem,
) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO order_items (
            order_id,
            id,
            name,
            price,
            product_id,
            quantity,
            position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            order_id,
            item.id,
            item.name,
            item.price,
            item.product_id,
            item.quantity,
            position as i64,
        ],
    )?;
    Ok(())
}

fn load_item_ids(tx: &Transaction<'_>, order_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = tx.prepare(
        "SELECT id
         FROM order_items
         WHERE order_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([order_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn parse_order_header(row: &Row<'_>) -> rusqlite::Result<OrderHeader> {
    Ok(OrderHeader {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        total: row.get("total")?,
    })
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<OrderItem> {
    Ok(OrderItem {
        id: row.get("id")?,
        name: row.get("name")?,
        price: row.get("price")?,
        product_id: row.get("product_id")?,
        quantity: row.get("quantity")?,
    })
}

fn assemble_order(header: OrderHeader, items: Vec<OrderItem>) -> RepoResult<Order> {
    let order = Order {
        id: header.id,
        customer_id: header.customer_id,
        items,
    };
    order.validate().map_err(|err| {
        RepoError::InvalidData(format!("order `{}` in orders: {err}", order.id))
    })?;

    let computed = order.total();
    if computed != header.total {
        return Err(RepoError::InvalidData(format!(
            "order `{}` stores total {} but items sum to {computed}",
            order.id, header.total
        )));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::plan_item_changes;
    use crate::model::order::OrderItem;

    fn item(id: &str) -> OrderItem {
        OrderItem::new(id, "name", 10, "p1", 1).unwrap()
    }

    #[test]
    fn plan_splits_update_insert_and_delete() {
        let existing = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let incoming = vec![item("3"), item("4"), item("1")];

        let plan = plan_item_changes(&existing, &incoming);

        let updated: Vec<_> = plan
            .update
            .iter()
            .map(|(position, item)| (*position, item.id.as_str()))
            .collect();
        assert_eq!(updated, vec![(0, "3"), (2, "1")]);

        let inserted: Vec<_> = plan
            .insert
            .iter()
            .map(|(position, item)| (*position, item.id.as_str()))
            .collect();
        assert_eq!(inserted, vec![(1, "4")]);

        assert_eq!(plan.delete, vec!["2".to_string()]);
    }

    #[test]
    fn plan_against_empty_store_inserts_everything() {
        let incoming = vec![item("1"), item("2")];
        let plan = plan_item_changes(&[], &incoming);
        assert!(plan.update.is_empty());
        assert!(plan.delete.is_empty());
        assert_eq!(plan.insert.len(), 2);
    }
}
