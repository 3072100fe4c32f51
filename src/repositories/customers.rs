use crate::models::customers::{Customer, RankEntry, TopReferrer};
use crate::utils;

use anyhow::bail;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const CREATE_CUSTOMERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL UNIQUE,
        phone TEXT UNIQUE,
        referral_code TEXT NOT NULL UNIQUE,
        referrals INTEGER NOT NULL DEFAULT 0,
        referred_persons INTEGER NOT NULL DEFAULT 0,
        position INTEGER NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

// Columns the pre-referral-program table did not have.
const REQUIRED_COLUMNS: [&str; 4] = ["referrals", "referred_persons", "phone", "position"];

/// Creates the customers table, or rebuilds a legacy one in place when any
/// of the referral-program columns are missing.
pub async fn prepare_schema(conn: &SqlitePool) -> Result<(), anyhow::Error> {
    let columns: Vec<String> = sqlx::query("PRAGMA table_info(customers)")
        .fetch_all(conn)
        .await?
        .iter()
        .map(|row| row.get("name"))
        .collect();

    if columns.is_empty() {
        sqlx::query(CREATE_CUSTOMERS_TABLE).execute(conn).await?;
        return Ok(());
    }

    if REQUIRED_COLUMNS
        .iter()
        .all(|required| columns.iter().any(|have| have == required))
    {
        return Ok(());
    }

    log::info!("Legacy customers table found, rebuilding with referral columns.");
    rebuild_legacy_table(conn).await
}

async fn rebuild_legacy_table(conn: &SqlitePool) -> Result<(), anyhow::Error> {
    let mut tx = conn.begin().await?;

    sqlx::query(
        "CREATE TABLE customers_backup AS SELECT id, name, email, referral_code FROM customers",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("DROP TABLE customers").execute(&mut *tx).await?;
    sqlx::query(CREATE_CUSTOMERS_TABLE).execute(&mut *tx).await?;

    // Positions are handed out in signup order. Rows that predate referral
    // codes get a generated one so the UNIQUE NOT NULL constraint holds.
    sqlx::query(
        r#"
        INSERT INTO customers (id, name, email, referral_code, referrals, referred_persons, position)
        SELECT CAST(id AS TEXT),
               name,
               email,
               COALESCE(referral_code, lower(hex(randomblob(5)))),
               0,
               0,
               ROW_NUMBER() OVER (ORDER BY id)
        FROM customers_backup
        "#,
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("DROP TABLE customers_backup")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

#[derive(Clone)]
pub struct CustomerRepository {
    conn: SqlitePool,
}

impl CustomerRepository {
    pub fn new(conn: SqlitePool) -> Self {
        CustomerRepository { conn }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, anyhow::Error> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.conn)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, anyhow::Error> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&self.conn)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<Customer>, anyhow::Error> {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE referral_code = ?")
                .bind(referral_code)
                .fetch_optional(&self.conn)
                .await?;

        Ok(customer)
    }

    /// Inserts a signup at the end of the waitlist. When `referred_by` is
    /// given, the owning customer's referral counters are credited in the
    /// same transaction.
    pub async fn create_customer(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        referred_by: Option<&str>,
    ) -> Result<Customer, anyhow::Error> {
        let customer_id = Uuid::new_v4().hyphenated().to_string();
        let referral_code = utils::generate_referral_code();

        let mut tx = self.conn.begin().await?;

        if let Some(code) = referred_by {
            let credited = sqlx::query(
                r#"
                UPDATE customers
                SET referrals = referrals + 1,
                    referred_persons = referred_persons + 1,
                    updated_at = CURRENT_TIMESTAMP
                WHERE referral_code = ?
                "#,
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;

            if credited.rows_affected() == 0 {
                bail!("InvalidReferralCode")
            }
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&mut *tx)
            .await?;
        let position = count + 1;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, email, phone, referral_code, position)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&customer_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(&referral_code)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(customer)
    }

    /// Moves the referrer one position up (never above 1) and inserts a row
    /// for the referred email right behind the new position. Returns the
    /// referrer's new position, or None when nobody owns the code.
    pub async fn apply_referral(
        &self,
        referral_code: &str,
        email: &str,
    ) -> Result<Option<i64>, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let referrer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE referral_code = ?")
                .bind(referral_code)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(referrer) = referrer else {
            return Ok(None);
        };

        let new_position = if referrer.position > 1 {
            referrer.position - 1
        } else {
            1
        };

        sqlx::query(
            r#"
            UPDATE customers
            SET position = ?, updated_at = CURRENT_TIMESTAMP
            WHERE referral_code = ?
            "#,
        )
        .bind(new_position)
        .bind(referral_code)
        .execute(&mut *tx)
        .await?;

        let referred_id = Uuid::new_v4().hyphenated().to_string();
        let referred_code = utils::generate_referral_code();

        sqlx::query(
            "INSERT INTO customers (id, email, referral_code, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&referred_id)
        .bind(email)
        .bind(&referred_code)
        .bind(new_position + 1)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(new_position))
    }

    pub async fn top_referrers(&self, limit: i64) -> Result<Vec<TopReferrer>, anyhow::Error> {
        let top = sqlx::query_as::<_, TopReferrer>(
            "SELECT name, email, referrals FROM customers ORDER BY referrals DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.conn)
        .await?;

        Ok(top)
    }

    pub async fn rank_data(&self) -> Result<Vec<RankEntry>, anyhow::Error> {
        let entries = sqlx::query_as::<_, RankEntry>(
            r#"
            SELECT name, email, position, referral_code, referred_persons
            FROM customers
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(entries)
    }
}
