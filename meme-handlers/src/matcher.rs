//! Keyword matching over the flattened keyword list of the catalog.

use meme_client::MemeInfo;

/// All meme keywords in catalog order. The first matching keyword wins.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    /// Empty keywords are dropped: in fuzzy mode they would match every message.
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn from_catalog(memes: &[MemeInfo]) -> Self {
        Self::new(memes.iter().flat_map(|m| m.keywords.iter().cloned()).collect())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.keywords.iter().any(|k| k == name)
    }

    /// Exact mode compares the first whitespace-separated token; fuzzy mode returns the first
    /// keyword contained anywhere in `text`.
    pub fn match_keyword(&self, text: &str, fuzzy: bool) -> Option<&str> {
        let found = if fuzzy {
            self.keywords.iter().find(|k| text.contains(k.as_str()))
        } else {
            let first = text.split_whitespace().next()?;
            self.keywords.iter().find(|k| k.as_str() == first)
        };
        found.map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(vec![
            "打".to_string(),
            "打拳".to_string(),
            "摸".to_string(),
        ])
    }

    #[test]
    fn test_exact_match_uses_first_token() {
        let m = matcher();
        assert_eq!(m.match_keyword("打拳 @123", false), Some("打拳"));
        assert_eq!(m.match_keyword("  摸   hi", false), Some("摸"));
        assert_eq!(m.match_keyword("我要打拳", false), None);
        assert_eq!(m.match_keyword("   ", false), None);
    }

    #[test]
    fn test_fuzzy_match_returns_first_keyword_in_catalog_order() {
        let m = matcher();
        // "打" precedes "打拳" in the list, so it wins even though "打拳" is longer
        assert_eq!(m.match_keyword("我要打拳", true), Some("打"));
        assert_eq!(m.match_keyword("摸摸头", true), Some("摸"));
        assert_eq!(m.match_keyword("hello", true), None);
    }

    #[test]
    fn test_empty_keywords_are_ignored() {
        let m = KeywordMatcher::new(vec![String::new(), "摸".to_string()]);
        assert_eq!(m.keywords().len(), 1);
        assert_eq!(m.match_keyword("hello", true), None);
        assert!(m.is_keyword("摸"));
        assert!(!m.is_keyword(""));
    }
}
