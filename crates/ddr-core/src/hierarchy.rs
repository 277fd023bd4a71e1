//! Static hierarchy table: models, their parents, and id arity.
//!
//! ```text
//! repository ← organization ← collection ← entity ← file
//!                                                  ← file-tmp
//! ```
//!
//! The arity table, the id patterns and the id templates in
//! [`crate::identifier`] describe the same scheme and must change together.

use crate::error::{DdrError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A level of the archival content hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Model {
    Repository,
    Organization,
    Collection,
    Entity,
    File,
    /// A file whose sha1 is not yet known (role assigned, content not hashed).
    FileTmp,
}

/// Component count → model. Counts not listed here are not identifiers.
const ARITY: &[(usize, Model)] = &[
    (1, Model::Repository),
    (2, Model::Organization),
    (3, Model::Collection),
    (4, Model::Entity),
    (6, Model::File),
];

/// Model → parent model.
const PARENTS: &[(Model, Option<Model>)] = &[
    (Model::File, Some(Model::Entity)),
    (Model::FileTmp, Some(Model::Entity)),
    (Model::Entity, Some(Model::Collection)),
    (Model::Collection, Some(Model::Organization)),
    (Model::Organization, Some(Model::Repository)),
    (Model::Repository, None),
];

impl Model {
    pub const ALL: [Model; 6] = [
        Model::Repository,
        Model::Organization,
        Model::Collection,
        Model::Entity,
        Model::File,
        Model::FileTmp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Repository => "repository",
            Model::Organization => "organization",
            Model::Collection => "collection",
            Model::Entity => "entity",
            Model::File => "file",
            Model::FileTmp => "file-tmp",
        }
    }

    /// Parent model, `None` for the repository.
    pub fn parent(&self) -> Option<Model> {
        PARENTS
            .iter()
            .find(|(model, _)| model == self)
            .and_then(|(_, parent)| *parent)
    }

    /// Model implied by a component count.
    pub fn from_arity(count: usize) -> Option<Model> {
        ARITY
            .iter()
            .find(|(n, _)| *n == count)
            .map(|(_, model)| *model)
    }

    /// Ancestors from the immediate parent up to the repository.
    pub fn ancestors(&self) -> impl Iterator<Item = Model> {
        std::iter::successors(self.parent(), |m| m.parent())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = DdrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "repository" | "repo" => Ok(Model::Repository),
            "organization" | "org" => Ok(Model::Organization),
            "collection" => Ok(Model::Collection),
            "entity" => Ok(Model::Entity),
            "file" => Ok(Model::File),
            "file-tmp" => Ok(Model::FileTmp),
            _ => Err(DdrError::invalid_argument(format!("unknown model: {}", s))),
        }
    }
}

/// Guess a model from an opaque id by counting its components.
///
/// Returns `None` ("unknown") for any count outside the arity table.
pub fn model_from_id(object_id: &str) -> Option<Model> {
    let object_id = object_id.trim();
    if object_id.is_empty() {
        return None;
    }
    Model::from_arity(object_id.split('-').count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        for model in Model::ALL {
            assert_eq!(model.as_str().parse::<Model>().unwrap(), model);
        }
        assert_eq!("org".parse::<Model>().unwrap(), Model::Organization);
        assert!(matches!(
            "widget".parse::<Model>(),
            Err(DdrError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parents() {
        assert_eq!(Model::File.parent(), Some(Model::Entity));
        assert_eq!(Model::FileTmp.parent(), Some(Model::Entity));
        assert_eq!(Model::Entity.parent(), Some(Model::Collection));
        assert_eq!(Model::Collection.parent(), Some(Model::Organization));
        assert_eq!(Model::Organization.parent(), Some(Model::Repository));
        assert_eq!(Model::Repository.parent(), None);
    }

    #[test]
    fn test_every_model_has_exactly_one_parent_row() {
        for model in Model::ALL {
            assert_eq!(PARENTS.iter().filter(|(m, _)| *m == model).count(), 1);
        }
    }

    #[test]
    fn test_ancestors() {
        let chain: Vec<Model> = Model::File.ancestors().collect();
        assert_eq!(
            chain,
            vec![
                Model::Entity,
                Model::Collection,
                Model::Organization,
                Model::Repository
            ]
        );
        assert_eq!(Model::Repository.ancestors().count(), 0);
    }

    #[test]
    fn test_model_from_id() {
        assert_eq!(model_from_id("ddr"), Some(Model::Repository));
        assert_eq!(model_from_id("ddr-testing"), Some(Model::Organization));
        assert_eq!(model_from_id("ddr-testing-123"), Some(Model::Collection));
        assert_eq!(model_from_id("ddr-testing-123-1"), Some(Model::Entity));
        assert_eq!(
            model_from_id("ddr-testing-123-1-master-a1b2c3d4e5"),
            Some(Model::File)
        );
    }

    #[test]
    fn test_model_from_id_unknown_arity() {
        assert_eq!(model_from_id(""), None);
        assert_eq!(model_from_id("ddr-testing-123-1-master"), None);
        assert_eq!(model_from_id("a-b-c-d-e-f-g"), None);
        for count in 7..12 {
            let id = vec!["x"; count].join("-");
            assert_eq!(model_from_id(&id), None);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Model::FileTmp).unwrap(), "\"file-tmp\"");
        let model: Model = serde_json::from_str("\"organization\"").unwrap();
        assert_eq!(model, Model::Organization);
    }
}
