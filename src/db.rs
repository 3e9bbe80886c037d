use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::config::AppConfig;

/// One schema change with its inverse / 数据库迁移
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub up: &'static [&'static str],
    pub down: &'static [&'static str],
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: &[r#"
            CREATE TABLE users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#],
        down: &["DROP TABLE users"],
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up: &[
            r#"
            CREATE TABLE sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            "CREATE INDEX sessions_user_id ON sessions(user_id)",
        ],
        down: &["DROP TABLE sessions"],
    },
    Migration {
        version: 3,
        name: "create_customers",
        up: &[r#"
            CREATE TABLE customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL,
                username TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#],
        down: &["DROP TABLE customers"],
    },
    // 搜索用的小写列及索引
    // The `*_lower` columns hold Unicode lower-case copies written by the
    // store; SQLite's own lower() only folds ASCII.
    Migration {
        version: SEARCH_COLUMNS_VERSION,
        name: "add_lower_indexes_to_customers",
        up: &[
            "ALTER TABLE customers ADD COLUMN last_name_lower TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE customers ADD COLUMN first_name_lower TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE customers ADD COLUMN email_lower TEXT NOT NULL DEFAULT ''",
            "CREATE INDEX customers_lower_last_name ON customers (last_name_lower)",
            "CREATE INDEX customers_lower_first_name ON customers (first_name_lower)",
            "CREATE INDEX customers_lower_email ON customers (email_lower)",
        ],
        down: &[
            "DROP INDEX customers_lower_last_name",
            "DROP INDEX customers_lower_first_name",
            "DROP INDEX customers_lower_email",
            "ALTER TABLE customers DROP COLUMN last_name_lower",
            "ALTER TABLE customers DROP COLUMN first_name_lower",
            "ALTER TABLE customers DROP COLUMN email_lower",
        ],
    },
];

/// Migration that introduces the lower-cased search columns
const SEARCH_COLUMNS_VERSION: i64 = 4;

/// Fill the lower-cased search columns of rows that predate them
async fn backfill_search_columns(conn: &mut SqliteConnection) -> Result<u64> {
    let rows: Vec<(i64, String, String, String)> =
        sqlx::query_as("SELECT id, first_name, last_name, email FROM customers")
            .fetch_all(&mut *conn)
            .await?;

    for (id, first_name, last_name, email) in &rows {
        sqlx::query(
            "UPDATE customers SET first_name_lower = ?, last_name_lower = ?, email_lower = ? WHERE id = ?",
        )
        .bind(first_name.to_lowercase())
        .bind(last_name.to_lowercase())
        .bind(email.to_lowercase())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(rows.len() as u64)
}

/// Generate random password / 生成随机密码
fn generate_random_password(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%^&*";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Open the main database, creating the file if needed / 打开主数据库
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    tracing::info!("Database connected: {}", database_url);
    Ok(pool)
}

/// Single-connection in-memory database; the data lives as long as the pool
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Run database migrations / 运行数据库迁移
///
/// Applies every migration newer than the recorded schema version, each in
/// its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current = schema_version(pool).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let mut tx = pool.begin().await?;

        for statement in migration.up {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        if migration.version == SEARCH_COLUMNS_VERSION {
            let filled = backfill_search_columns(&mut *tx).await?;
            if filled > 0 {
                tracing::info!("Filled search columns for {} existing customers", filled);
            }
        }

        sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Applied migration {} {}", migration.version, migration.name);
    }

    Ok(())
}

/// Revert the most recent migration / 回滚最近一次迁移
///
/// Returns the reverted version, or `None` when nothing is applied.
pub async fn revert_last_migration(pool: &SqlitePool) -> Result<Option<i64>> {
    let current = schema_version(pool).await?;
    let Some(migration) = MIGRATIONS.iter().find(|m| m.version == current) else {
        return Ok(None);
    };

    let mut tx = pool.begin().await?;

    for statement in migration.down {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    sqlx::query("DELETE FROM schema_migrations WHERE version = ?")
        .bind(migration.version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Reverted migration {} {}", migration.version, migration.name);

    Ok(Some(migration.version))
}

pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Create a user with a bcrypt-hashed password / 创建用户
pub async fn create_user(pool: &SqlitePool, email: &str, password: &str, cost: u32) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let password_hash = bcrypt::hash(password, cost)?;

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(email.trim().to_lowercase())
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Create the first account when no user exists yet / 首次运行时创建管理员账号
///
/// Returns the generated password so the caller can report it once.
pub async fn ensure_admin_user(pool: &SqlitePool, config: &AppConfig) -> Result<Option<String>> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count > 0 {
        return Ok(None);
    }

    let admin_password = generate_random_password(16);
    create_user(pool, &config.auth.admin_email, &admin_password, config.auth.bcrypt_cost).await?;

    tracing::warn!("Default account created:");
    tracing::warn!("  Email: {}", config.auth.admin_email);
    tracing::warn!("  Password: {}", admin_password);
    tracing::warn!("Please change this password after first login!");

    Ok(Some(admin_password))
}
