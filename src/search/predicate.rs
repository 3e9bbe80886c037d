//! Customer match predicate / 客户匹配谓词
//!
//! A predicate is built once from a [`Keyword`] and can be rendered to a
//! parameterized SQL fragment or evaluated against a [`Customer`] in memory.
//! Both forms follow the same rule: every token must match at least one of
//! last name, first name or email.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::keyword::{fold_case, prefix_upper_bound, Keyword};
use crate::models::Customer;

/// How a token is compared with a field / 匹配模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Field starts with the token; served by the `customers_lower_*` indexes
    #[default]
    Prefix,
    /// Field contains the token anywhere; full scan
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    LastName,
    FirstName,
    Email,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::LastName, SearchField::FirstName, SearchField::Email];

    /// Indexed lower-case copy of the field / 小写索引列
    pub fn column(self) -> &'static str {
        match self {
            SearchField::LastName => "last_name_lower",
            SearchField::FirstName => "first_name_lower",
            SearchField::Email => "email_lower",
        }
    }

    pub fn value(self, customer: &Customer) -> &str {
        match self {
            SearchField::LastName => &customer.last_name,
            SearchField::FirstName => &customer.first_name,
            SearchField::Email => &customer.email,
        }
    }
}

/// `ORDER BY` clause shared by every customer listing
pub const DIRECTORY_ORDER: &str = "last_name_lower, first_name_lower, id";

/// In-memory equivalent of [`DIRECTORY_ORDER`]
pub fn directory_order(a: &Customer, b: &Customer) -> Ordering {
    fold_case(&a.last_name)
        .cmp(&fold_case(&b.last_name))
        .then_with(|| fold_case(&a.first_name).cmp(&fold_case(&b.first_name)))
        .then_with(|| a.id.cmp(&b.id))
}

/// SQL text with `?` placeholders and the values to bind, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    tokens: Vec<String>,
    mode: MatchMode,
}

impl SearchPredicate {
    pub fn new(keyword: &Keyword, mode: MatchMode) -> Self {
        Self {
            tokens: keyword.tokens().to_vec(),
            mode,
        }
    }

    pub fn parse(raw: &str, mode: MatchMode, max_tokens: usize) -> Self {
        Self::new(&Keyword::parse(raw, max_tokens), mode)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// An empty predicate matches no customer / 空谓词不匹配任何客户
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        if self.is_empty() {
            return false;
        }
        self.tokens.iter().all(|token| {
            SearchField::ALL
                .iter()
                .any(|field| self.token_matches(&fold_case(field.value(customer)), token))
        })
    }

    fn token_matches(&self, value: &str, token: &str) -> bool {
        match self.mode {
            MatchMode::Prefix => value.starts_with(token),
            MatchMode::Contains => value.contains(token),
        }
    }

    /// Render as a `WHERE` clause body / 生成 WHERE 子句
    pub fn to_sql(&self) -> SqlFragment {
        if self.is_empty() {
            return SqlFragment {
                sql: "0 = 1".to_string(),
                params: Vec::new(),
            };
        }

        let mut params = Vec::new();
        let groups: Vec<String> = self
            .tokens
            .iter()
            .map(|token| {
                let terms: Vec<String> = SearchField::ALL
                    .iter()
                    .map(|field| self.token_sql(field.column(), token, &mut params))
                    .collect();
                format!("({})", terms.join(" OR "))
            })
            .collect();

        SqlFragment {
            sql: groups.join(" AND "),
            params,
        }
    }

    fn token_sql(&self, column: &str, token: &str, params: &mut Vec<String>) -> String {
        match self.mode {
            MatchMode::Prefix => match prefix_upper_bound(token) {
                Some(upper) => {
                    // range form lets SQLite use the column index
                    params.push(token.to_string());
                    params.push(upper);
                    format!("({column} >= ? AND {column} < ?)")
                }
                None => {
                    params.push(token.to_string());
                    format!("instr({column}, ?) = 1")
                }
            },
            MatchMode::Contains => {
                params.push(token.to_string());
                format!("instr({column}, ?) > 0")
            }
        }
    }
}
