use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::search::CustomerIndex;

/// Login failure records / 登录失败记录
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub fail_count: u32,
    pub last_attempt: DateTime<Utc>,
}

/// Login security state / 登录安全状态
///
/// Failures are counted per (lower-cased) email. After `max_failures`
/// failures inside the lockout window the email is blocked until the window
/// has passed since the last failure.
pub struct LoginSecurity {
    attempts: RwLock<HashMap<String, LoginAttempt>>,
    max_failures: u32,
    lockout: Duration,
}

impl LoginSecurity {
    pub fn new(max_failures: u32, lockout_minutes: i64) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            max_failures,
            lockout: Duration::minutes(lockout_minutes),
        }
    }

    /// Check if email is blocked / 检查是否被封禁
    pub fn is_blocked(&self, email: &str) -> bool {
        self.is_blocked_at(email, Utc::now())
    }

    fn is_blocked_at(&self, email: &str, now: DateTime<Utc>) -> bool {
        let attempts = self.attempts.read();
        if let Some(attempt) = attempts.get(email) {
            if attempt.fail_count >= self.max_failures {
                return now.signed_duration_since(attempt.last_attempt) < self.lockout;
            }
        }
        false
    }

    /// Record login failure / 记录登录失败
    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Utc::now());
    }

    fn record_failure_at(&self, email: &str, now: DateTime<Utc>) {
        let mut attempts = self.attempts.write();
        // Drop records whose window has passed / 清理过期记录
        attempts.retain(|_, a| now.signed_duration_since(a.last_attempt) < self.lockout);

        let entry = attempts.entry(email.to_string()).or_insert(LoginAttempt {
            fail_count: 0,
            last_attempt: now,
        });
        entry.fail_count += 1;
        entry.last_attempt = now;
    }

    /// Login successful, clear failure records / 登录成功
    pub fn clear_failure(&self, email: &str) {
        self.attempts.write().remove(email);
    }
}

pub struct AppState {
    pub db: SqlitePool,
    pub config: AppConfig,
    pub customers: CustomerIndex,
    pub login_security: LoginSecurity,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        let login_security =
            LoginSecurity::new(config.auth.max_failed_logins, config.auth.lockout_minutes);
        Self {
            customers: CustomerIndex::with_config(db.clone(), config.search.clone()),
            db,
            config,
            login_security,
        }
    }
}
