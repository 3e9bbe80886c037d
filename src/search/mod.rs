//! Customer search / 客户搜索
//!
//! - keyword: normalize the raw keyword into lower-cased tokens
//! - predicate: composable match rule, renders to SQL or evaluates in memory
//! - customer_index: runs predicates against the indexed customers table

pub mod customer_index;
pub mod keyword;
pub mod predicate;

pub use customer_index::CustomerIndex;
pub use keyword::Keyword;
pub use predicate::{directory_order, MatchMode, SearchField, SearchPredicate};
