//! Text classification: deciding whether a raw string is translatable.

use regex::Regex;

/// Checks if the text contains at least one CJK Unified Ideograph.
///
/// # Examples
///
/// ```
/// use hanwrap::classify::is_cjk;
///
/// assert!(is_cjk("你好"));
/// assert!(is_cjk("hello 世界"));
/// assert!(!is_cjk("hello"));
/// assert!(!is_cjk(""));
/// ```
pub fn is_cjk(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '\u{4E00}'..='\u{9FFF}'))
}

/// Removes the first match of `re` from `text`.
///
/// Returns the residual text and the removed match (empty when no match).
pub fn split_first_match(text: &str, re: &Regex) -> (String, String) {
    match re.find(text) {
        Some(m) => {
            let mut rest = String::with_capacity(text.len() - m.len());
            rest.push_str(&text[..m.start()]);
            rest.push_str(&text[m.end()..]);
            (rest, m.as_str().to_string())
        }
        None => (text.to_string(), String::new()),
    }
}

/// A literal value found in source: either a plain string or the ordered
/// quasi segments of a template literal.
#[derive(Debug, Clone)]
pub enum LiteralValue {
    Single(String),
    Segments(Vec<String>),
}

impl LiteralValue {
    pub fn first_segment(&self) -> &str {
        match self {
            LiteralValue::Single(s) => s,
            LiteralValue::Segments(v) => v.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Concatenation of all segments, used for CJK classification so that a
    /// template whose CJK content sits next to an interpolation hole is
    /// still detected.
    pub fn classifiable_text(&self) -> String {
        match self {
            LiteralValue::Single(s) => s.clone(),
            LiteralValue::Segments(v) => v.concat(),
        }
    }
}

/// Result of stripping configured leading/trailing ignore patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitEdges {
    /// Core text with `{0}`, `{1}`, … placeholders between segments.
    pub core: String,
    pub prefix: String,
    pub suffix: String,
}

/// Strips the leading pattern from the first segment and the trailing
/// pattern from the last segment (interior segments untouched), then joins
/// segments with positional placeholders.
pub fn split_ignored_edges(value: &LiteralValue, leading: &Regex, trailing: &Regex) -> SplitEdges {
    match value {
        LiteralValue::Single(s) => {
            let (rest, prefix) = split_first_match(s, leading);
            let (core, suffix) = split_first_match(&rest, trailing);
            SplitEdges {
                core,
                prefix,
                suffix,
            }
        }
        LiteralValue::Segments(segments) => {
            let mut parts = segments.clone();
            let last = parts.len() - 1;
            let (head, prefix) = split_first_match(&parts[0], leading);
            parts[0] = head;
            let (tail, suffix) = split_first_match(&parts[last], trailing);
            parts[last] = tail;
            let mut core = String::new();
            for (i, part) in parts.iter().enumerate() {
                core.push_str(part);
                if i < last {
                    core.push_str(&format!("{{{}}}", i));
                }
            }
            SplitEdges {
                core,
                prefix,
                suffix,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leading() -> Regex {
        Regex::new(r"^\s+").unwrap()
    }

    fn trailing() -> Regex {
        Regex::new(r"\s+$").unwrap()
    }

    #[test]
    fn test_is_cjk() {
        assert!(is_cjk("你好"));
        assert!(is_cjk("a你b"));
        assert!(is_cjk("中"));
        assert!(!is_cjk("hello"));
        assert!(!is_cjk("123"));
        assert!(!is_cjk(""));
        // Katakana is outside the unified-ideograph range
        assert!(!is_cjk("カタカナ"));
    }

    #[test]
    fn test_split_first_match() {
        let (rest, m) = split_first_match("  你好", &leading());
        assert_eq!(rest, "你好");
        assert_eq!(m, "  ");

        let (rest, m) = split_first_match("你好", &leading());
        assert_eq!(rest, "你好");
        assert_eq!(m, "");
    }

    #[test]
    fn test_split_edges_single() {
        let value = LiteralValue::Single(" 你好 ".to_string());
        let split = split_ignored_edges(&value, &leading(), &trailing());
        assert_eq!(split.core, "你好");
        assert_eq!(split.prefix, " ");
        assert_eq!(split.suffix, " ");
    }

    #[test]
    fn test_split_edges_segments_placeholders() {
        let value = LiteralValue::Segments(vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
        ]);
        let split = split_ignored_edges(&value, &leading(), &trailing());
        assert_eq!(split.core, "A{0}B{1}C");
        assert_eq!(split.prefix, "");
        assert_eq!(split.suffix, "");
    }

    #[test]
    fn test_split_edges_segments_edges_only_touch_outer() {
        let value = LiteralValue::Segments(vec![
            "  你好".to_string(),
            " 中间 ".to_string(),
            "世界  ".to_string(),
        ]);
        let split = split_ignored_edges(&value, &leading(), &trailing());
        assert_eq!(split.core, "你好{0} 中间 {1}世界");
        assert_eq!(split.prefix, "  ");
        assert_eq!(split.suffix, "  ");
    }

    #[test]
    fn test_split_edges_fully_consumed() {
        let value = LiteralValue::Single("   ".to_string());
        let split = split_ignored_edges(&value, &leading(), &trailing());
        assert_eq!(split.core, "");
    }
}
