//! Small helpers shared by the inventory modules.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Runs of digits or non-digits.
static CHUNKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+|\D+").unwrap());

/// One piece of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalChunk {
    Number(u128),
    Text(String),
}

/// Split text into a key that sorts digit runs numerically.
///
/// ```
/// use ddr_core::util::natural_key;
///
/// let mut labels = vec!["WD5000-10", "WD5000-9", "WD5000-100"];
/// labels.sort_by_key(|s| natural_key(s));
/// assert_eq!(labels, vec!["WD5000-9", "WD5000-10", "WD5000-100"]);
/// ```
pub fn natural_key(text: &str) -> Vec<NaturalChunk> {
    CHUNKS
        .find_iter(text)
        .map(|m| {
            let chunk = m.as_str();
            match chunk.parse::<u128>() {
                Ok(n) if chunk.bytes().all(|b| b.is_ascii_digit()) => NaturalChunk::Number(n),
                _ => NaturalChunk::Text(chunk.to_lowercase()),
            }
        })
        .collect()
}

/// Compare two strings in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b)).then_with(|| a.cmp(b))
}

/// Falsy in the sense hand-edited manifests use: absent, null, empty string,
/// empty array or object, zero, or `false`.
pub(crate) fn is_blank(value: Option<&serde_json::Value>) -> bool {
    use serde_json::Value;
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("ddr-testing-2", "ddr-testing-10"), Ordering::Less);
        assert_eq!(natural_cmp("b", "A"), Ordering::Greater);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
    }

    #[test]
    fn test_natural_sort() {
        let mut cids = vec!["ddr-densho-12", "ddr-densho-2", "ddr-densho-1"];
        cids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(cids, vec!["ddr-densho-1", "ddr-densho-2", "ddr-densho-12"]);
    }

    #[test]
    fn test_is_blank() {
        let obj = json!({"a": "", "b": [], "c": 0, "d": "x", "e": [1]});
        assert!(is_blank(obj.get("a")));
        assert!(is_blank(obj.get("b")));
        assert!(is_blank(obj.get("c")));
        assert!(is_blank(obj.get("missing")));
        assert!(!is_blank(obj.get("d")));
        assert!(!is_blank(obj.get("e")));
    }
}
