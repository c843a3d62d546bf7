/// Integration tests for the PostgreSQL credential store and catalog models
///
/// Require a running PostgreSQL; see `common/mod.rs`.

mod common;

use common::{setup_pool, unique};
use futures::future::join_all;
use sqlx::PgPool;
use tokoku_shared::models::category::{Category, CategoryInput};
use tokoku_shared::models::order::{Order, OrderInput};
use tokoku_shared::models::product::{Product, ProductInput};
use tokoku_shared::models::supplier::{Supplier, SupplierInput};
use tokoku_shared::models::user::User;
use tokoku_shared::store::{CredentialStore, PgCredentialStore, StoreError};

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_foreign_key_violation())
}

async fn seed_product(pool: &PgPool) -> Product {
    let category = Category::create(pool, CategoryInput { name: unique("cat") })
        .await
        .expect("Failed to create category");
    let supplier = Supplier::create(
        pool,
        SupplierInput {
            name: unique("sup"),
            email: format!("{}@example.com", unique("sales")),
        },
    )
    .await
    .expect("Failed to create supplier");

    Product::create(
        pool,
        ProductInput {
            name: "Green tea".to_string(),
            description: String::new(),
            price: 1.25,
            category_id: category.id,
            supplier_id: supplier.id,
        },
    )
    .await
    .expect("Failed to create product")
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_pg_store_insert_and_find() {
    let pool = setup_pool().await;
    let store = PgCredentialStore::new(pool.clone());

    let user = store.insert("alice", "$argon2id$fake").await.unwrap();
    let by_name = store.find_by_username("alice").await.unwrap().unwrap();
    let by_id = store.find_by_id(user.id).await.unwrap().unwrap();

    assert_eq!(by_name.id, user.id);
    assert_eq!(by_id.username, "alice");
    assert!(store.find_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_pg_store_duplicate_username() {
    let pool = setup_pool().await;
    let store = PgCredentialStore::new(pool);

    store.insert("alice", "h1").await.unwrap();
    let err = store.insert("alice", "h2").await.unwrap_err();

    assert!(matches!(err, StoreError::DuplicateUsername));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_pg_store_concurrent_registrations() {
    let pool = setup_pool().await;
    let store = PgCredentialStore::new(pool);

    let attempts = (0..10).map(|i| {
        let store = store.clone();
        async move { store.insert("carol", &format!("hash-{}", i)).await }
    });
    let results = join_all(attempts).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::DuplicateUsername)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 9);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_user_delete() {
    let pool = setup_pool().await;
    let store = PgCredentialStore::new(pool.clone());
    let user = store.insert("dave", "h").await.unwrap();

    assert!(User::delete(&pool, user.id).await.unwrap());
    assert!(!User::delete(&pool, user.id).await.unwrap());
    assert!(store.find_by_id(user.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_category_crud() {
    let pool = setup_pool().await;

    let created = Category::create(&pool, CategoryInput { name: "Snacks".to_string() })
        .await
        .unwrap();
    let updated = Category::update(&pool, created.id, CategoryInput { name: "Chips".to_string() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Chips");
    assert!(updated.updated_at >= created.updated_at);

    let listed = Category::list(&pool, 100, 0).await.unwrap();
    assert_eq!(listed.len(), 1);

    assert!(Category::update(&pool, 9999, CategoryInput { name: "x".to_string() })
        .await
        .unwrap()
        .is_none());
    assert!(Category::delete(&pool, created.id).await.unwrap());
    assert!(Category::find_by_id(&pool, created.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_duplicate_category_name_is_unique_violation() {
    let pool = setup_pool().await;

    Category::create(&pool, CategoryInput { name: "Dairy".to_string() }).await.unwrap();
    let err = Category::create(&pool, CategoryInput { name: "Dairy".to_string() })
        .await
        .unwrap_err();

    assert!(matches!(err, sqlx::Error::Database(ref e) if e.is_unique_violation()));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_product_requires_existing_references() {
    let pool = setup_pool().await;

    let err = Product::create(
        &pool,
        ProductInput {
            name: "Orphan".to_string(),
            description: String::new(),
            price: 1.0,
            category_id: 404,
            supplier_id: 404,
        },
    )
    .await
    .unwrap_err();

    assert!(is_foreign_key_violation(&err));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_referenced_rows_cannot_be_deleted() {
    let pool = setup_pool().await;
    let product = seed_product(&pool).await;

    let err = Category::delete(&pool, product.category_id).await.unwrap_err();
    assert!(is_foreign_key_violation(&err));

    let order = Order::create(
        &pool,
        OrderInput {
            product_id: product.id,
            quantity: 2,
            total: 2.5,
        },
    )
    .await
    .unwrap();

    let err = Product::delete(&pool, product.id).await.unwrap_err();
    assert!(is_foreign_key_violation(&err));

    assert!(Order::delete(&pool, order.id).await.unwrap());
    assert!(Product::delete(&pool, product.id).await.unwrap());
    assert!(Category::delete(&pool, product.category_id).await.unwrap());
    assert!(Supplier::delete(&pool, product.supplier_id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_order_update_and_list() {
    let pool = setup_pool().await;
    let product = seed_product(&pool).await;

    let order = Order::create(
        &pool,
        OrderInput {
            product_id: product.id,
            quantity: 1,
            total: 1.25,
        },
    )
    .await
    .unwrap();

    let updated = Order::update(
        &pool,
        order.id,
        OrderInput {
            product_id: product.id,
            quantity: 4,
            total: 5.0,
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.quantity, 4);
    assert_eq!(Order::list(&pool, 10, 0).await.unwrap().len(), 1);
    assert!(Order::list(&pool, 10, 1).await.unwrap().is_empty());
}
