//! Keyword highlighting for notification text

use crate::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};

/// Wrap every occurrence of `keyword` in highlight markers.
///
/// Splits on the keyword and rejoins the segments with the marked
/// keyword between them. A keyword that does not occur (or is empty)
/// leaves the text untouched.
pub fn highlight(text: &str, keyword: &str) -> String {
    if keyword.is_empty() {
        return text.to_string();
    }

    let segments: Vec<&str> = text.split(keyword).collect();
    if segments.len() == 1 {
        return text.to_string();
    }

    let marked = format!("{}{}{}", HIGHLIGHT_OPEN, keyword, HIGHLIGHT_CLOSE);
    segments.join(&marked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_occurrence_marked() {
        assert_eq!(
            highlight("alpha BIRD beta BIRD gamma", "BIRD"),
            "alpha \"BIRD\" beta \"BIRD\" gamma"
        );
    }

    #[test]
    fn test_missing_keyword_unchanged() {
        assert_eq!(highlight("alpha beta", "BIRD"), "alpha beta");
    }

    #[test]
    fn test_keyword_at_edges() {
        assert_eq!(highlight("BIRD flies", "BIRD"), "\"BIRD\" flies");
        assert_eq!(highlight("a BIRD", "BIRD"), "a \"BIRD\"");
    }

    #[test]
    fn test_empty_keyword_unchanged() {
        assert_eq!(highlight("alpha", ""), "alpha");
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(highlight("古い土器の展示", "土器"), "古い\"土器\"の展示");
    }
}
