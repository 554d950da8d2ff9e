use checkout_core::db::open_db;
use checkout_core::{
    Customer, CustomerRepository, CustomerService, Order, OrderItem, OrderRepository, Product,
    ProductRepository, SqliteCustomerRepository, SqliteOrderRepository, SqliteProductRepository,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const WRITER_ROUNDS: usize = 200;

#[test]
fn readers_see_whole_order_while_another_connection_updates() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("checkout.db");
    seed_store(&db_path);

    let before = small_order();
    let after = large_order();
    {
        let conn = open_db(&db_path).unwrap();
        SqliteOrderRepository::try_new(&conn)
            .unwrap()
            .create(&before)
            .unwrap();
    }

    let writer_done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            let conn = open_db(&db_path).unwrap();
            let repo = SqliteOrderRepository::try_new(&conn).unwrap();
            for round in 0..WRITER_ROUNDS {
                let next = if round % 2 == 0 { &after } else { &before };
                repo.update(next).unwrap();
            }
            writer_done.store(true, Ordering::SeqCst);
        });

        let conn = open_db(&db_path).unwrap();
        let repo = SqliteOrderRepository::try_new(&conn).unwrap();
        while !writer_done.load(Ordering::SeqCst) {
            let found = repo.find("o1").unwrap().unwrap();
            assert!(
                found == before || found == after,
                "find returned a mixed order: {found:?}"
            );

            let all = repo.find_all().unwrap();
            assert_eq!(all.len(), 1);
            assert!(
                all[0] == before || all[0] == after,
                "find_all returned a mixed order: {:?}",
                all[0]
            );
        }
    });

    // WRITER_ROUNDS is even, so the last write restores `before`.
    let conn = open_db(&db_path).unwrap();
    let repo = SqliteOrderRepository::try_new(&conn).unwrap();
    assert_eq!(repo.find("o1").unwrap(), Some(before));
}

#[test]
fn find_sees_committed_update_from_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("checkout.db");
    seed_store(&db_path);

    let writer = open_db(&db_path).unwrap();
    let reader = open_db(&db_path).unwrap();
    let writer_repo = SqliteOrderRepository::try_new(&writer).unwrap();
    let reader_repo = SqliteOrderRepository::try_new(&reader).unwrap();

    writer_repo.create(&small_order()).unwrap();
    assert_eq!(reader_repo.find("o1").unwrap(), Some(small_order()));

    writer_repo.update(&large_order()).unwrap();
    assert_eq!(reader_repo.find("o1").unwrap(), Some(large_order()));
    assert_eq!(reader_repo.find_all().unwrap(), vec![large_order()]);
}

#[test]
fn concurrent_awards_on_separate_connections_are_all_kept() {
    const AWARDS_PER_THREAD: i64 = 50;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("checkout.db");
    seed_store(&db_path);

    thread::scope(|scope| {
        for _ in 0..2 {
            scope.spawn(|| {
                let conn = open_db(&db_path).unwrap();
                let service =
                    CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
                for _ in 0..AWARDS_PER_THREAD {
                    // An order total of 2 earns exactly one point.
                    service.award_points("c1", 2).unwrap();
                }
            });
        }
    });

    let conn = open_db(&db_path).unwrap();
    let customer = SqliteCustomerRepository::try_new(&conn)
        .unwrap()
        .find("c1")
        .unwrap()
        .unwrap();
    assert_eq!(customer.reward_points, 2 * AWARDS_PER_THREAD);
}

fn seed_store(db_path: &Path) {
    let conn = open_db(db_path).unwrap();
    SqliteCustomerRepository::try_new(&conn)
        .unwrap()
        .create(&Customer::new("c1", "Customer 1").unwrap())
        .unwrap();
    let products = SqliteProductRepository::try_new(&conn).unwrap();
    products
        .create(&Product::new("p1", "Product 1", 10).unwrap())
        .unwrap();
    products
        .create(&Product::new("p2", "Product 2", 20).unwrap())
        .unwrap();
}

fn small_order() -> Order {
    Order::new(
        "o1",
        "c1",
        vec![OrderItem::new("1", "Product 1", 10, "p1", 1).unwrap()],
    )
    .unwrap()
}

/// Shares no item id with `small_order`, so a torn read would pair one
/// order's header with the other's items and fail the stored-total check.
fn large_order() -> Order {
    Order::new(
        "o1",
        "c1",
        vec![
            OrderItem::new("2", "Product 2", 20, "p2", 3).unwrap(),
            OrderItem::new("3", "Product 1", 10, "p1", 4).unwrap(),
        ],
    )
    .unwrap()
}
