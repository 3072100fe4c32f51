use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use waitlist_service::repositories::customers::{prepare_schema, CustomerRepository};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    prepare_schema(&pool).await.unwrap();

    pool
}

#[tokio::test]
async fn signup_assigns_sequential_positions() {
    let repo = CustomerRepository::new(test_pool().await);

    let first = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    let second = repo
        .create_customer("Ben", "ben@example.com", "0000000002", None)
        .await
        .unwrap();
    let third = repo
        .create_customer("Cam", "cam@example.com", "0000000003", None)
        .await
        .unwrap();

    assert_eq!(first.position, 1);
    assert_eq!(second.position, 2);
    assert_eq!(third.position, 3);
}

#[tokio::test]
async fn new_customers_get_a_fresh_referral_code_and_zero_counters() {
    let repo = CustomerRepository::new(test_pool().await);

    let customer = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();

    assert_eq!(customer.referral_code.len(), 9);
    assert_eq!(customer.referrals, 0);
    assert_eq!(customer.referred_persons, 0);
    assert_eq!(customer.phone.as_deref(), Some("0000000001"));
}

#[tokio::test]
async fn duplicate_email_is_rejected_by_the_store() {
    let repo = CustomerRepository::new(test_pool().await);

    repo.create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    let result = repo
        .create_customer("Imposter", "ada@example.com", "0000000002", None)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn duplicate_phone_is_rejected_by_the_store() {
    let repo = CustomerRepository::new(test_pool().await);

    repo.create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    let result = repo
        .create_customer("Ben", "ben@example.com", "0000000001", None)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn lookups_by_email_phone_and_code_roundtrip() {
    let repo = CustomerRepository::new(test_pool().await);

    let created = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();

    let by_email = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    let by_phone = repo.find_by_phone("0000000001").await.unwrap().unwrap();
    let by_code = repo
        .find_by_referral_code(&created.referral_code)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(by_email.id, created.id);
    assert_eq!(by_phone.id, created.id);
    assert_eq!(by_code.id, created.id);

    assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn signup_with_referral_credits_both_counters() {
    let repo = CustomerRepository::new(test_pool().await);

    let referrer = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    repo.create_customer(
        "Ben",
        "ben@example.com",
        "0000000002",
        Some(&referrer.referral_code),
    )
    .await
    .unwrap();

    let credited = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(credited.referrals, 1);
    assert_eq!(credited.referred_persons, 1);
}

#[tokio::test]
async fn signup_with_unknown_referral_code_fails_and_inserts_nothing() {
    let repo = CustomerRepository::new(test_pool().await);

    let result = repo
        .create_customer("Ben", "ben@example.com", "0000000002", Some("nosuchcod"))
        .await;

    assert!(result.is_err());
    assert!(repo.find_by_email("ben@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn referral_moves_referrer_up_and_places_referred_behind() {
    let repo = CustomerRepository::new(test_pool().await);

    repo.create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    let referrer = repo
        .create_customer("Ben", "ben@example.com", "0000000002", None)
        .await
        .unwrap();
    assert_eq!(referrer.position, 2);

    let new_position = repo
        .apply_referral(&referrer.referral_code, "friend@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(new_position, 1);

    let moved = repo.find_by_email("ben@example.com").await.unwrap().unwrap();
    assert_eq!(moved.position, 1);

    let referred = repo
        .find_by_email("friend@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(referred.position, 2);
    assert_eq!(referred.name, "");
    assert!(referred.phone.is_none());
    assert_eq!(referred.referral_code.len(), 9);
}

#[tokio::test]
async fn referral_never_moves_a_referrer_above_first_place() {
    let repo = CustomerRepository::new(test_pool().await);

    let referrer = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    assert_eq!(referrer.position, 1);

    let new_position = repo
        .apply_referral(&referrer.referral_code, "friend@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(new_position, 1);
}

#[tokio::test]
async fn referral_with_unknown_code_returns_none() {
    let repo = CustomerRepository::new(test_pool().await);

    let result = repo
        .apply_referral("nosuchcod", "friend@example.com")
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(repo
        .find_by_email("friend@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn top_referrers_orders_by_referrals_and_honors_the_limit() {
    let repo = CustomerRepository::new(test_pool().await);

    let ada = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    let ben = repo
        .create_customer("Ben", "ben@example.com", "0000000002", None)
        .await
        .unwrap();

    for n in 0..3 {
        repo.create_customer(
            "Friend",
            &format!("friend{}@example.com", n),
            &format!("111111111{}", n),
            Some(&ada.referral_code),
        )
        .await
        .unwrap();
    }
    repo.create_customer(
        "Friend",
        "friend9@example.com",
        "1111111119",
        Some(&ben.referral_code),
    )
    .await
    .unwrap();

    let top = repo.top_referrers(2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].email, "ada@example.com");
    assert_eq!(top[0].referrals, 3);
    assert_eq!(top[1].email, "ben@example.com");
    assert_eq!(top[1].referrals, 1);
}

#[tokio::test]
async fn rank_data_is_ordered_by_position() {
    let repo = CustomerRepository::new(test_pool().await);

    repo.create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    let referrer = repo
        .create_customer("Ben", "ben@example.com", "0000000002", None)
        .await
        .unwrap();
    repo.create_customer("Cam", "cam@example.com", "0000000003", None)
        .await
        .unwrap();

    repo.apply_referral(&referrer.referral_code, "friend@example.com")
        .await
        .unwrap();

    let entries = repo.rank_data().await.unwrap();
    assert_eq!(entries.len(), 4);
    for pair in entries.windows(2) {
        assert!(pair[0].position <= pair[1].position);
    }
}

#[tokio::test]
async fn prepare_schema_is_idempotent() {
    let pool = test_pool().await;
    prepare_schema(&pool).await.unwrap();

    let repo = CustomerRepository::new(pool);
    let customer = repo
        .create_customer("Ada", "ada@example.com", "0000000001", None)
        .await
        .unwrap();
    assert_eq!(customer.position, 1);
}

#[tokio::test]
async fn legacy_table_is_rebuilt_with_positions_in_signup_order() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            referral_code TEXT,
            referred_persons INTEGER DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO customers (name, email, referral_code) VALUES ('Ada', 'ada@example.com', 'adacode99')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO customers (name, email) VALUES ('Ben', 'ben@example.com')")
        .execute(&pool)
        .await
        .unwrap();

    prepare_schema(&pool).await.unwrap();

    let repo = CustomerRepository::new(pool);

    let ada = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(ada.position, 1);
    assert_eq!(ada.referral_code, "adacode99");
    assert_eq!(ada.referrals, 0);

    // Rows that predate referral codes get a generated one.
    let ben = repo.find_by_email("ben@example.com").await.unwrap().unwrap();
    assert_eq!(ben.position, 2);
    assert!(!ben.referral_code.is_empty());

    let next = repo
        .create_customer("Cam", "cam@example.com", "0000000003", None)
        .await
        .unwrap();
    assert_eq!(next.position, 3);
}
