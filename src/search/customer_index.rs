//! Customer store / 客户存储
//!
//! Customers live in the main database. Every write also stores the
//! case-folded `*_lower` copies of the searchable fields; the three
//! `customers_lower_*` indexes on those columns make prefix searches cheap.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqlitePool;
use std::path::Path;

use super::keyword::fold_case;
use super::predicate::{SearchPredicate, DIRECTORY_ORDER};
use crate::config::SearchConfig;
use crate::error::AppResult;
use crate::models::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, username, created_at";

/// Customer search index / 客户搜索索引
#[derive(Clone)]
pub struct CustomerIndex {
    db: SqlitePool,
    config: SearchConfig,
}

const INSERT_CUSTOMER: &str = "INSERT INTO customers
    (first_name, last_name, email, username, first_name_lower, last_name_lower, email_lower, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

impl CustomerIndex {
    /// Use existing database pool with default search settings / 使用现有数据库连接池
    pub fn new(db: SqlitePool) -> Self {
        Self::with_config(db, SearchConfig::default())
    }

    pub fn with_config(db: SqlitePool, config: SearchConfig) -> Self {
        Self { db, config }
    }

    /// Predicate for a raw keyword under the configured mode and token cap
    pub fn predicate(&self, keyword: &str) -> SearchPredicate {
        SearchPredicate::parse(keyword, self.config.match_mode, self.config.max_tokens)
    }

    /// Search by raw keyword / 按关键词搜索
    pub async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<Customer>, sqlx::Error> {
        self.search(&self.predicate(keyword)).await
    }

    /// Run a predicate, ordered by last name then first name / 按姓、名排序
    pub async fn search(&self, predicate: &SearchPredicate) -> Result<Vec<Customer>, sqlx::Error> {
        if predicate.is_empty() {
            return Ok(Vec::new());
        }

        let fragment = predicate.to_sql();
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {} ORDER BY {DIRECTORY_ORDER}",
            fragment.sql
        );

        let mut query = sqlx::query_as::<_, Customer>(&sql);
        for param in &fragment.params {
            query = query.bind(param);
        }

        let customers = query.fetch_all(&self.db).await?;

        tracing::debug!(
            "Customer search: {} token(s), mode {:?}, {} hit(s)",
            predicate.tokens().len(),
            predicate.mode(),
            customers.len()
        );

        Ok(customers)
    }

    /// Query plan of a search, one detail line per step
    pub async fn explain(&self, predicate: &SearchPredicate) -> Result<Vec<String>, sqlx::Error> {
        let fragment = predicate.to_sql();
        let sql = format!(
            "EXPLAIN QUERY PLAN SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {} ORDER BY {DIRECTORY_ORDER}",
            fragment.sql
        );

        let mut query = sqlx::query_as::<_, (i64, i64, i64, String)>(&sql);
        for param in &fragment.params {
            query = query.bind(param);
        }

        let rows = query.fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(|(_, _, _, detail)| detail).collect())
    }

    pub async fn insert(&self, customer: &NewCustomer) -> Result<Customer, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = bind_new_customer(sqlx::query(INSERT_CUSTOMER), customer, &now)
            .execute(&self.db)
            .await?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            username: customer.username.clone(),
            created_at: now,
        })
    }

    /// Insert all or nothing / 批量插入（事务）
    pub async fn insert_many(&self, customers: &[NewCustomer]) -> Result<u64, sqlx::Error> {
        let mut tx = self.db.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        for customer in customers {
            bind_new_customer(sqlx::query(INSERT_CUSTOMER), customer, &now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(customers.len() as u64)
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.db)
            .await
    }

    /// Import customers from a JSON array file / 从JSON文件导入客户
    pub async fn import_file(&self, path: &Path) -> AppResult<u64> {
        let content = tokio::fs::read_to_string(path).await?;
        let customers: Vec<NewCustomer> = serde_json::from_str(&content)?;
        let imported = self.insert_many(&customers).await?;

        tracing::info!("Imported {} customers from {:?}", imported, path);
        Ok(imported)
    }
}

fn bind_new_customer<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    customer: &'q NewCustomer,
    now: &'q str,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.username)
        .bind(fold_case(&customer.first_name))
        .bind(fold_case(&customer.last_name))
        .bind(fold_case(&customer.email))
        .bind(now)
        .bind(now)
}
