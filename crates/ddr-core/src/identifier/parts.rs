//! Named identifier components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keywords that can legally appear in an id, in id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPart {
    Repo,
    Org,
    Cid,
    Eid,
    Role,
    Sha1,
    Ext,
}

impl IdPart {
    pub const ALL: [IdPart; 7] = [
        IdPart::Repo,
        IdPart::Org,
        IdPart::Cid,
        IdPart::Eid,
        IdPart::Role,
        IdPart::Sha1,
        IdPart::Ext,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IdPart::Repo => "repo",
            IdPart::Org => "org",
            IdPart::Cid => "cid",
            IdPart::Eid => "eid",
            IdPart::Role => "role",
            IdPart::Sha1 => "sha1",
            IdPart::Ext => "ext",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        IdPart::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for IdPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A component value. All-digit components are integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(u64),
    Text(String),
}

impl IdValue {
    /// Coerce all-digit text to an integer.
    ///
    /// Digit strings whose integer form would render differently (leading
    /// zeros, overflow) stay text so formatting reproduces the input.
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<u64>() {
                if n.to_string() == raw {
                    return IdValue::Int(n);
                }
            }
        }
        IdValue::Text(raw.to_string())
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            IdValue::Int(n) => Some(*n),
            IdValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::Int(n) => write!(f, "{}", n),
            IdValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for IdValue {
    fn from(n: u64) -> Self {
        IdValue::Int(n)
    }
}

impl From<&str> for IdValue {
    fn from(s: &str) -> Self {
        IdValue::parse(s)
    }
}

impl From<String> for IdValue {
    fn from(s: String) -> Self {
        IdValue::parse(&s)
    }
}

/// Ordered mapping of component → value.
pub type IdParts = BTreeMap<IdPart, IdValue>;

/// Build an [`IdParts`] from `(part, value)` pairs.
///
/// ```
/// use ddr_core::identifier::{idparts, IdPart, IdValue};
///
/// let parts = idparts([(IdPart::Repo, "ddr".into()), (IdPart::Cid, 123u64.into())]);
/// assert_eq!(parts[&IdPart::Cid], IdValue::Int(123));
/// ```
pub fn idparts<I>(pairs: I) -> IdParts
where
    I: IntoIterator<Item = (IdPart, IdValue)>,
{
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        assert_eq!(IdValue::parse("123"), IdValue::Int(123));
        assert_eq!(IdValue::parse("master"), IdValue::Text("master".into()));
        assert_eq!(IdValue::parse("a1b2c3"), IdValue::Text("a1b2c3".into()));
        assert_eq!(IdValue::parse(""), IdValue::Text(String::new()));
    }

    #[test]
    fn test_leading_zero_stays_text() {
        assert_eq!(IdValue::parse("007"), IdValue::Text("007".into()));
        assert_eq!(IdValue::parse("0"), IdValue::Int(0));
        assert_eq!(IdValue::parse("007").to_string(), "007");
    }

    #[test]
    fn test_part_order_is_id_order() {
        let parts = idparts([
            (IdPart::Sha1, "abc".into()),
            (IdPart::Repo, "ddr".into()),
            (IdPart::Cid, 1u64.into()),
        ]);
        let keys: Vec<IdPart> = parts.keys().copied().collect();
        assert_eq!(keys, vec![IdPart::Repo, IdPart::Cid, IdPart::Sha1]);
    }

    #[test]
    fn test_part_names() {
        for part in IdPart::ALL {
            assert_eq!(IdPart::from_name(part.name()), Some(part));
        }
        assert_eq!(IdPart::from_name("basepath"), None);
    }
}
