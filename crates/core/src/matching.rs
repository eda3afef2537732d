//! Case-insensitive, word-boundary keyword matching.

use regex_lite::Regex;

/// A compiled set of keywords.
///
/// Each keyword matches on word boundaries, so `"app"` does not match
/// `"happy"`. Multi-word keywords match as phrases. Blank keywords are
/// dropped, since an empty pattern would match any text.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    keywords: Vec<(String, Regex)>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Result<Self, regex_lite::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| {
                let pattern = format!(r"(?i)\b{}\b", regex_lite::escape(&keyword));
                Regex::new(&pattern).map(|re| (keyword, re))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keywords })
    }

    /// Keywords found in `text`, in declaration order.
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.keywords.iter().any(|(_, re)| re.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundaries() {
        let set = KeywordSet::new(["app"]).unwrap();
        assert!(set.is_match("The app crashed"));
        assert!(!set.is_match("I am happy"));
    }

    #[test]
    fn test_case_insensitive_phrases() {
        let set = KeywordSet::new(["Forgot Password", "login"]).unwrap();
        assert_eq!(set.matches("I FORGOT PASSWORD and cannot LOGIN"), vec!["forgot password", "login"]);
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let set = KeywordSet::new(["sign-in", "a.s.a.p"]).unwrap();
        assert!(set.is_match("the sign-in page is blank"));
        assert!(set.is_match("fix it a.s.a.p please"));
        assert!(!set.is_match("signin"));
        assert!(!set.is_match("axsxaxp"));
    }

    #[test]
    fn test_blank_keywords_are_dropped() {
        let set = KeywordSet::new([" ", "", "refund"]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.is_match("something unrelated"));
        assert!(set.is_match("refund please"));
    }

    #[test]
    fn test_empty_set() {
        let set = KeywordSet::new(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_match("anything"));
    }
}
