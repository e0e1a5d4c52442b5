//! Sqlite connection management and schema setup.

use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:lifeline.db";

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hospitals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                latitude REAL,
                longitude REAL,
                emergency_contact TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS donors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                name TEXT NOT NULL,
                blood_type TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                city TEXT NOT NULL,
                address TEXT,
                available INTEGER NOT NULL DEFAULT 1,
                last_donation TEXT,
                latitude REAL,
                longitude REAL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blood_banks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                latitude REAL,
                longitude REAL,
                operating_hours TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blood_batches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                blood_bank_id INTEGER NOT NULL,
                blood_type TEXT NOT NULL,
                units INTEGER NOT NULL,
                expiry_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (blood_bank_id) REFERENCES blood_banks (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blood_inventory (
                blood_bank_id INTEGER NOT NULL,
                blood_type TEXT NOT NULL,
                units INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                UNIQUE (blood_bank_id, blood_type),
                FOREIGN KEY (blood_bank_id) REFERENCES blood_banks (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blood_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hospital_id INTEGER,
                patient_name TEXT,
                age INTEGER,
                gender TEXT,
                hemoglobin REAL,
                platelets REAL,
                blood_type TEXT NOT NULL,
                units INTEGER NOT NULL DEFAULT 1,
                component_type TEXT NOT NULL DEFAULT 'Whole Blood',
                urgency TEXT NOT NULL DEFAULT 'normal',
                is_critical INTEGER NOT NULL DEFAULT 0,
                diagnosis TEXT,
                past_reaction TEXT,
                allergies TEXT,
                doctor_name TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                donor_id INTEGER,
                contact_phone TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                fulfilled_at TEXT,
                FOREIGN KEY (hospital_id) REFERENCES hospitals (id),
                FOREIGN KEY (donor_id) REFERENCES donors (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Indices backing the hot filters and orderings
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_requests_status_urgency_created
            ON blood_requests (status, urgency, created_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_batches_bank_type_expiry
            ON blood_batches (blood_bank_id, blood_type, expiry_date);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
