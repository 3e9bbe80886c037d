//! Keyword normalization / 关键词规范化
//!
//! Keywords and the stored `*_lower` search columns are folded by the same
//! function, [`fold_case`], so both sides of every comparison agree.

/// Unicode lower-casing used for keywords and search columns / 大小写折叠
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Normalized search keyword / 规范化后的关键词
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyword {
    tokens: Vec<String>,
}

impl Keyword {
    /// Split on whitespace, lower-case and de-duplicate, keeping at most `max_tokens`
    pub fn parse(raw: &str, max_tokens: usize) -> Self {
        let mut tokens: Vec<String> = Vec::new();

        for word in raw.split_whitespace() {
            let lower = fold_case(word);
            if tokens.contains(&lower) {
                continue;
            }
            if tokens.len() == max_tokens {
                tracing::debug!("Keyword has more than {} tokens, ignoring the rest", max_tokens);
                break;
            }
            tokens.push(lower);
        }

        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Blank keywords match nothing / 空关键词不匹配任何记录
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Smallest string greater than every string starting with `prefix`
///
/// Used as the exclusive upper bound of an index range scan. `None` when the
/// last character cannot be incremented.
pub fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    let last = chars.pop()?;

    let next = match char::from_u32(last as u32 + 1) {
        Some(c) => c,
        // skip the surrogate gap
        None if last == '\u{D7FF}' => '\u{E000}',
        None => return None,
    };

    let mut bound: String = chars.into_iter().collect();
    bound.push(next);
    Some(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_lowercases() {
        let keyword = Keyword::parse("  Bob  ", 8);
        assert_eq!(keyword.tokens(), ["bob"]);
    }

    #[test]
    fn test_parse_blank() {
        assert!(Keyword::parse("", 8).is_empty());
        assert!(Keyword::parse(" \t\n ", 8).is_empty());
    }

    #[test]
    fn test_parse_multiple_tokens_dedup() {
        let keyword = Keyword::parse("Bob JONES bob", 8);
        assert_eq!(keyword.tokens(), ["bob", "jones"]);
    }

    #[test]
    fn test_parse_caps_token_count() {
        let keyword = Keyword::parse("a b c d e", 3);
        assert_eq!(keyword.tokens(), ["a", "b", "c"]);
    }

    #[test]
    fn test_parse_folds_non_ascii() {
        let keyword = Keyword::parse("ÉMILE Ångström", 8);
        assert_eq!(keyword.tokens(), ["émile", "ångström"]);
        assert_eq!(Keyword::parse("émile Émile", 8).tokens(), ["émile"]);
    }

    #[test]
    fn test_prefix_upper_bound() {
        assert_eq!(prefix_upper_bound("bob").as_deref(), Some("boc"));
        assert_eq!(prefix_upper_bound("bo@").as_deref(), Some("boA"));
        assert_eq!(prefix_upper_bound("a\u{D7FF}").as_deref(), Some("a\u{E000}"));
        assert_eq!(prefix_upper_bound("a\u{10FFFF}"), None);
        assert_eq!(prefix_upper_bound(""), None);
    }
}
