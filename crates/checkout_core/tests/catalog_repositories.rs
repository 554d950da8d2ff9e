use checkout_core::db::open_db_in_memory;
use checkout_core::{
    Address, Customer, CustomerRepository, EntityKind, Product, ProductRepository, RepoError,
    SqliteCustomerRepository, SqliteProductRepository,
};

#[test]
fn customer_roundtrip_preserves_address_and_flags() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();

    let mut customer = Customer::new("123", "Customer 1").unwrap();
    customer.change_address(Address::new("Street 1", 1, "Zipcode 1", "City 1").unwrap());
    customer.activate().unwrap();
    customer.add_reward_points(10);
    repo.create(&customer).unwrap();

    assert_eq!(repo.find("123").unwrap(), Some(customer));
}

#[test]
fn customer_without_address_roundtrips_as_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();

    let customer = Customer::new("123", "Customer 1").unwrap();
    repo.create(&customer).unwrap();

    let loaded = repo.find("123").unwrap().unwrap();
    assert!(loaded.address.is_none());
    assert!(!loaded.active);
}

#[test]
fn customer_update_overwrites_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();

    let mut customer = Customer::new("123", "Customer 1").unwrap();
    repo.create(&customer).unwrap();

    customer.change_name("Customer 2").unwrap();
    customer.change_address(Address::new("Street 2", 2, "Zipcode 2", "City 2").unwrap());
    repo.update(&customer).unwrap();

    assert_eq!(repo.find("123").unwrap(), Some(customer));
}

#[test]
fn customer_update_of_missing_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();

    let err = repo
        .update(&Customer::new("ghost", "Nobody").unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            kind: EntityKind::Customer,
            ..
        }
    ));
}

#[test]
fn customer_with_partial_address_row_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO customers (id, name, street) VALUES ('c1', 'Customer 1', 'Street 1');",
        [],
    )
    .unwrap();

    assert!(matches!(
        repo.find("c1").unwrap_err(),
        RepoError::InvalidData(_)
    ));
}

#[test]
fn customer_find_all_is_sorted_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();

    for id in ["b", "c", "a"] {
        repo.create(&Customer::new(id, format!("Customer {id}")).unwrap())
            .unwrap();
    }

    let ids: Vec<_> = repo
        .find_all()
        .unwrap()
        .into_iter()
        .map(|customer| customer.id)
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn product_create_update_find() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();

    let mut product = Product::new("123", "Product 1", 10).unwrap();
    repo.create(&product).unwrap();
    assert_eq!(repo.find("123").unwrap(), Some(product.clone()));

    product.change_name("Product 2").unwrap();
    product.change_price(25).unwrap();
    repo.update(&product).unwrap();
    assert_eq!(repo.find("123").unwrap(), Some(product.clone()));

    assert_eq!(repo.find_all().unwrap(), vec![product]);
    assert!(repo.find("missing").unwrap().is_none());
}

#[test]
fn product_duplicate_create_is_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();

    let product = Product::new("123", "Product 1", 10).unwrap();
    repo.create(&product).unwrap();

    assert!(repo.create(&product).unwrap_err().is_constraint_violation());
}

#[test]
fn product_update_rejects_invalid_entity() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();

    let mut product = Product::new("123", "Product 1", 10).unwrap();
    repo.create(&product).unwrap();
    product.price = 0;

    assert!(matches!(
        repo.update(&product).unwrap_err(),
        RepoError::InvalidProduct(_)
    ));
}
