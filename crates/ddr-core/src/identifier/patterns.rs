//! Ordered pattern tables for ids, paths and URLs.
//!
//! Every table is ordered most-specific first and matching stops at the
//! first hit, so a short prefix never shadows a longer structure. Patterns
//! are anchored at the start. The entity and collection path patterns are
//! open at the end so metadata filenames below them
//! (`.../ddr-test-123/collection.json`) still resolve to the owning object.

use super::parts::{IdPart, IdParts, IdValue};
use crate::hierarchy::Model;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Outcome of running text through a pattern table.
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    Matched {
        model: Model,
        /// Name of the row that matched, e.g. `file-ext-abs`.
        variant: &'static str,
        parts: IdParts,
        basepath: Option<PathBuf>,
    },
    NoMatch,
}

impl Identification {
    pub fn is_match(&self) -> bool {
        matches!(self, Identification::Matched { .. })
    }

    pub fn model(&self) -> Option<Model> {
        match self {
            Identification::Matched { model, .. } => Some(*model),
            Identification::NoMatch => None,
        }
    }
}

/// One compiled row of a pattern table.
pub(crate) struct Pattern {
    regex: Regex,
    variant: &'static str,
    model: Model,
}

type Row = (&'static str, &'static str, Model);

const ID_ROWS: &[Row] = &[
    (r"^(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)$", "file", Model::File),
    (r"^(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)$", "file-tmp", Model::FileTmp),
    (r"^(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)$", "entity", Model::Entity),
    (r"^(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)$", "collection", Model::Collection),
    (r"^(?P<repo>\w+)-(?P<org>\w+)$", "organization", Model::Organization),
    (r"^(?P<repo>\w+)$", "repository", Model::Repository),
];

const PATH_ROWS: &[Row] = &[
    // file
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)/files/(?P<repo1>\w+)-(?P<org1>\w+)-(?P<cid1>\d+)-(?P<eid1>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)\.(?P<ext>\w+)$",
        "file-ext-abs",
        Model::File,
    ),
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)/files/(?P<repo1>\w+)-(?P<org1>\w+)-(?P<cid1>\d+)-(?P<eid1>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)\.json$",
        "file-meta-abs",
        Model::File,
    ),
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)/files/(?P<repo1>\w+)-(?P<org1>\w+)-(?P<cid1>\d+)-(?P<eid1>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)$",
        "file-abs",
        Model::File,
    ),
    (
        r"^files/(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)-(?P<eid0>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)\.(?P<ext>\w+)$",
        "file-ext-rel",
        Model::File,
    ),
    (
        r"^files/(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)-(?P<eid0>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)\.json$",
        "file-meta-rel",
        Model::File,
    ),
    (
        r"^files/(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)-(?P<eid0>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)$",
        "file-rel",
        Model::File,
    ),
    // entity
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo0>\w+)-(?P<org0>\w+)-(?P<cid0>\d+)/files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)",
        "entity-abs",
        Model::Entity,
    ),
    (
        r"^files/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)$",
        "entity-rel",
        Model::Entity,
    ),
    // collection
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)",
        "collection-abs",
        Model::Collection,
    ),
    (r"^collection\.json$", "collection-meta-rel", Model::Collection),
    // organization
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo>\w+)-(?P<org>\w+)$",
        "organization-abs",
        Model::Organization,
    ),
    (r"^organization\.json$", "organization-meta-rel", Model::Organization),
    // repository
    (
        r"^(?P<basepath>[\w/]+/ddr/)(?P<repo>\w+)/repository\.json$",
        "repository-meta-abs",
        Model::Repository,
    ),
    (r"^repository\.json$", "repository-meta-rel", Model::Repository),
];

const URL_ROWS: &[Row] = &[
    // editor (/ui/<id>)
    (r"^/ui/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)-(?P<sha1>\w+)$", "editor-file", Model::File),
    (r"^/ui/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)-(?P<role>\w+)$", "editor-file-tmp", Model::FileTmp),
    (r"^/ui/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)-(?P<eid>\d+)$", "editor-entity", Model::Entity),
    (r"^/ui/(?P<repo>\w+)-(?P<org>\w+)-(?P<cid>\d+)$", "editor-collection", Model::Collection),
    (r"^/ui/(?P<repo>\w+)-(?P<org>\w+)$", "editor-organization", Model::Organization),
    (r"^/ui/(?P<repo>\w+)$", "editor-repository", Model::Repository),
    // public (/<repo>/<org>/...)
    (r"^/(?P<repo>\w+)/(?P<org>\w+)/(?P<cid>\d+)/(?P<eid>\d+)/(?P<role>\w+)/(?P<sha1>\w+)$", "public-file", Model::File),
    (r"^/(?P<repo>\w+)/(?P<org>\w+)/(?P<cid>\d+)/(?P<eid>\d+)/(?P<role>\w+)$", "public-file-tmp", Model::FileTmp),
    (r"^/(?P<repo>\w+)/(?P<org>\w+)/(?P<cid>\d+)/(?P<eid>\d+)$", "public-entity", Model::Entity),
    (r"^/(?P<repo>\w+)/(?P<org>\w+)/(?P<cid>\d+)$", "public-collection", Model::Collection),
    (r"^/(?P<repo>\w+)/(?P<org>\w+)$", "public-organization", Model::Organization),
    (r"^/(?P<repo>\w+)$", "public-repository", Model::Repository),
];

fn compile(rows: &[Row]) -> Vec<Pattern> {
    rows.iter()
        .map(|(pattern, variant, model)| Pattern {
            regex: Regex::new(pattern).unwrap(),
            variant: *variant,
            model: *model,
        })
        .collect()
}

pub(crate) static ID_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| compile(ID_ROWS));
pub(crate) static PATH_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| compile(PATH_ROWS));
pub(crate) static URL_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| compile(URL_ROWS));

/// Run `text` through `patterns`; the first matching row wins.
///
/// Only id components are kept from the captures (`repo0`, `cid1`, ... are
/// structural and dropped). A captured basepath loses its trailing separator.
pub(crate) fn identify(text: &str, patterns: &[Pattern]) -> Identification {
    for pattern in patterns {
        let Some(caps) = pattern.regex.captures(text) else {
            continue;
        };

        let mut parts = IdParts::new();
        for part in IdPart::ALL {
            if let Some(m) = caps.name(part.name()) {
                parts.insert(part, IdValue::parse(m.as_str()));
            }
        }
        let basepath = caps.name("basepath").map(|m| {
            let raw = m.as_str();
            PathBuf::from(raw.strip_suffix('/').unwrap_or(raw))
        });

        return Identification::Matched {
            model: pattern.model,
            variant: pattern.variant,
            parts,
            basepath,
        };
    }
    Identification::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        assert_eq!(ID_PATTERNS.len(), ID_ROWS.len());
        assert_eq!(PATH_PATTERNS.len(), PATH_ROWS.len());
        assert_eq!(URL_PATTERNS.len(), URL_ROWS.len());
    }

    #[test]
    fn test_first_match_wins() {
        let found = identify("ddr-test-1-2-master-abcdef", &ID_PATTERNS);
        assert_eq!(found.model(), Some(Model::File));
        let Identification::Matched { variant, parts, .. } = found else {
            panic!("expected match");
        };
        assert_eq!(variant, "file");
        assert_eq!(parts.len(), 6);
    }

    #[test]
    fn test_digits_become_integers() {
        let Identification::Matched { parts, .. } = identify("ddr-test-123-4", &ID_PATTERNS) else {
            panic!("expected match");
        };
        assert_eq!(parts.get(&IdPart::Cid), Some(&IdValue::Int(123)));
        assert_eq!(parts.get(&IdPart::Eid), Some(&IdValue::Int(4)));
        assert_eq!(parts.get(&IdPart::Org), Some(&IdValue::Text("test".into())));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(identify("ddr-test-abc", &ID_PATTERNS), Identification::NoMatch);
        assert_eq!(identify("", &ID_PATTERNS), Identification::NoMatch);
        assert_eq!(identify("ddr test", &ID_PATTERNS), Identification::NoMatch);
    }

    #[test]
    fn test_structural_groups_dropped() {
        let path = "/var/www/media/ddr/ddr-test-123/files/ddr-test-123-4";
        let Identification::Matched { parts, basepath, variant, .. } =
            identify(path, &PATH_PATTERNS)
        else {
            panic!("expected match");
        };
        assert_eq!(variant, "entity-abs");
        assert_eq!(parts.len(), 4);
        assert_eq!(basepath, Some(PathBuf::from("/var/www/media/ddr")));
    }

    #[test]
    fn test_metadata_filenames() {
        assert_eq!(
            identify("collection.json", &PATH_PATTERNS).model(),
            Some(Model::Collection)
        );
        assert_eq!(
            identify("/var/www/media/ddr/ddr-test-123/collection.json", &PATH_PATTERNS).model(),
            Some(Model::Collection)
        );
        assert_eq!(
            identify("/var/www/media/ddr/ddr/repository.json", &PATH_PATTERNS).model(),
            Some(Model::Repository)
        );
    }
}
