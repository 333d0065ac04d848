//! Text helpers shared by the collation and matrix tools

use regex::Regex;
use std::cmp::Ordering;

/// Longest common prefix of a set of names.
///
/// Repository names generated from a template share the template's name as a
/// prefix; the remainder is the student's login.
pub fn longest_common_prefix<S: AsRef<str>>(names: &[S]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut prefix: &str = first.as_ref();
    for name in &names[1..] {
        let name = name.as_ref();
        let shared = prefix
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, a), _)| i + a.len_utf8())
            .unwrap_or(0);
        prefix = &prefix[..shared];
        if prefix.is_empty() {
            break;
        }
    }
    prefix.to_string()
}

/// Normalize heading lines: `#\s*title` -> `# title`
pub fn normalize_headings(markdown: &str) -> String {
    let heading = Regex::new(r"(?m)^(#+)[ \t]*").unwrap();
    heading.replace_all(markdown, "$1 ").to_string()
}

/// Increment all heading levels of a markdown string, if it contains a
/// level-one heading. Heading spacing is normalized first.
///
/// Note: this doesn't know not to look in fenced blocks
pub fn increment_headings(markdown: &str) -> String {
    let markdown = normalize_headings(markdown);
    let h1 = Regex::new(r"(?m)^# ").unwrap();
    if h1.is_match(&markdown) {
        let heading = Regex::new(r"(?m)^(#+) ").unwrap();
        heading.replace_all(&markdown, "$1# ").to_string()
    } else {
        markdown
    }
}

/// One segment of a natural sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalPart {
    Number(u64),
    Text(String),
}

impl Ord for NaturalPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalPart::Number(a), NaturalPart::Number(b)) => a.cmp(b),
            (NaturalPart::Text(a), NaturalPart::Text(b)) => a.cmp(b),
            // Numbers sort before text, so "2" < "a" within a segment
            (NaturalPart::Number(_), NaturalPart::Text(_)) => Ordering::Less,
            (NaturalPart::Text(_), NaturalPart::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key that compares digit runs numerically, so `day2` < `day10`.
pub fn natural_sort_key(s: &str) -> Vec<NaturalPart> {
    let runs = Regex::new(r"\d+|\D+").unwrap();
    runs.find_iter(s)
        .map(|m| {
            let text = m.as_str();
            match text.parse::<u64>() {
                Ok(n) => NaturalPart::Number(n),
                Err(_) => NaturalPart::Text(text.to_string()),
            }
        })
        .collect()
}

/// Decode bytes as Latin-1 (each byte maps to the same code point).
///
/// Survey exports sometimes arrive ISO-8859-1 encoded; valid UTF-8 input
/// should be decoded as UTF-8 first and only fall back to this.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decode file bytes as UTF-8, falling back to Latin-1
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => latin1_to_string(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(
            longest_common_prefix(&["1-WELCOME-alice", "1-WELCOME-bob"]),
            "1-WELCOME-"
        );
        assert_eq!(longest_common_prefix(&["abc"]), "abc");
        assert_eq!(longest_common_prefix(&["abc", "xyz"]), "");
        assert_eq!(longest_common_prefix::<&str>(&[]), "");
    }

    #[test]
    fn test_normalize_headings() {
        assert_eq!(normalize_headings("#Title"), "# Title");
        assert_eq!(normalize_headings("##   Sub"), "## Sub");
        assert_eq!(normalize_headings("# Already fine"), "# Already fine");
        assert_eq!(normalize_headings("no headings"), "no headings");
    }

    #[test]
    fn test_increment_headings_with_h1() {
        assert_eq!(increment_headings("# Title\n## Sub"), "## Title\n### Sub");
        assert_eq!(increment_headings("#Title"), "## Title");
    }

    #[test]
    fn test_increment_headings_without_h1() {
        // No level-one heading: only normalization happens
        assert_eq!(increment_headings("## Sub\n### Subsub"), "## Sub\n### Subsub");
        let normalized = increment_headings("##  Sub");
        assert_eq!(normalized, "## Sub");
        // Idempotent when there is no H1
        assert_eq!(increment_headings(&normalized), normalized);
    }

    #[test]
    fn test_natural_sort_key() {
        let mut names = vec!["day10_reading.ipynb", "day2_reading.ipynb", "day1_reading.ipynb"];
        names.sort_by_key(|n| natural_sort_key(n));
        assert_eq!(
            names,
            vec!["day1_reading.ipynb", "day2_reading.ipynb", "day10_reading.ipynb"]
        );
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text("plain".as_bytes()), "plain");
        // 0xE9 is 'é' in ISO-8859-1 and invalid standalone UTF-8
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }
}
