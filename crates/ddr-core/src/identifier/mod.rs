//! Identifier resolution for repository, organization, collection, entity
//! and file objects.
//!
//! An [`Identifier`] can be built from any of the textual surfaces an object
//! shows up on:
//!
//! ```text
//! id     ddr-testing-123-4-master-a1b2c3d4e5
//! path   /var/www/media/ddr/ddr-testing-123/files/ddr-testing-123-4/files/ddr-testing-123-4-master-a1b2c3d4e5.jpg
//! url    http://example.org/ddr/testing/123/4/master/a1b2c3d4e5
//!        http://192.168.56.101/ui/ddr-testing-123-4-master-a1b2c3d4e5
//! ```
//!
//! Parsing runs the text through an ordered pattern table (see
//! [`patterns`]); the id string of path/URL identifiers is always rendered
//! from the captured components, never copied from the input.

mod format;
mod parts;
mod patterns;

pub use format::{format_id, format_path, format_url, required_parts, PathKind, PathVariant, UrlStyle};
pub use parts::{idparts, IdPart, IdParts, IdValue};
pub use patterns::Identification;

use crate::error::{DdrError, IdSurface, Result};
use crate::hierarchy::Model;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How an identifier was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMethod {
    Id,
    IdParts,
    Path,
    Url,
}

/// A parsed, immutable object identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    model: Model,
    parts: IdParts,
    id: String,
    basepath: Option<PathBuf>,
    method: IdMethod,
    raw: Option<String>,
}

fn check_base_path(base_path: Option<&Path>) -> Result<Option<PathBuf>> {
    match base_path {
        Some(p) if !p.is_absolute() => Err(DdrError::invalid_argument(format!(
            "Base path is not absolute: {}",
            p.display()
        ))),
        Some(p) => Ok(Some(p.to_path_buf())),
        None => Ok(None),
    }
}

fn strip_trailing_separator(text: &str) -> &str {
    text.strip_suffix('/').unwrap_or(text)
}

/// Guess the model of a metadata or content path, absolute or relative.
///
/// Uses the same ordered table as [`Identifier::from_path`].
pub fn identify_path(path: &str) -> Identification {
    patterns::identify(strip_trailing_separator(path), &patterns::PATH_PATTERNS)
}

/// Shorthand for `identify_path(path).model()`.
pub fn model_from_path(path: &str) -> Option<Model> {
    identify_path(path).model()
}

impl Identifier {
    /// Parse an object id.
    ///
    /// ```
    /// use ddr_core::identifier::Identifier;
    /// use ddr_core::Model;
    ///
    /// let i = Identifier::from_id("ddr-testing-123-456", None).unwrap();
    /// assert_eq!(i.model(), Model::Entity);
    /// assert_eq!(i.parent_id().as_deref(), Some("ddr-testing-123"));
    /// ```
    pub fn from_id(object_id: &str, base_path: Option<&Path>) -> Result<Self> {
        let basepath = check_base_path(base_path)?;
        match patterns::identify(object_id, &patterns::ID_PATTERNS) {
            Identification::Matched { model, parts, .. } => Ok(Self {
                model,
                parts,
                id: object_id.to_string(),
                basepath,
                method: IdMethod::Id,
                raw: Some(object_id.to_string()),
            }),
            Identification::NoMatch => Err(DdrError::InvalidIdentifier {
                text: object_id.to_string(),
                surface: IdSurface::Id,
            }),
        }
    }

    /// Build an identifier from components without parsing.
    ///
    /// Every component the model's id template needs must be present.
    pub fn from_idparts(parts: IdParts, model: Model, base_path: Option<&Path>) -> Result<Self> {
        let basepath = check_base_path(base_path)?;
        let id = format_id(&parts, model)?;
        Ok(Self {
            model,
            parts,
            id,
            basepath,
            method: IdMethod::IdParts,
            raw: None,
        })
    }

    /// Parse an absolute filesystem path.
    ///
    /// The basepath is taken from the path itself (everything up to and
    /// including the `ddr` directory).
    pub fn from_path(path_abs: impl AsRef<Path>) -> Result<Self> {
        let path_abs = path_abs.as_ref();
        if !path_abs.is_absolute() {
            return Err(DdrError::invalid_argument(format!(
                "Path is not absolute: {}",
                path_abs.display()
            )));
        }
        let raw = path_abs.to_string_lossy().to_string();
        Self::from_matched(
            identify_path(&raw),
            None,
            IdMethod::Path,
            raw,
            IdSurface::Path,
        )
    }

    /// Parse an editor (`/ui/<id>`) or public (`/<repo>/<org>/...`) URL.
    ///
    /// A bare URL path (`/ddr/testing/123`) is accepted as well.
    pub fn from_url(url: &str, base_path: Option<&Path>) -> Result<Self> {
        let basepath = check_base_path(base_path)?;
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) if url.starts_with('/') => url.to_string(),
            Err(_) => {
                return Err(DdrError::InvalidIdentifier {
                    text: url.to_string(),
                    surface: IdSurface::Url,
                })
            }
        };
        let found = patterns::identify(strip_trailing_separator(&path), &patterns::URL_PATTERNS);
        Self::from_matched(found, basepath, IdMethod::Url, url.to_string(), IdSurface::Url)
    }

    fn from_matched(
        found: Identification,
        basepath: Option<PathBuf>,
        method: IdMethod,
        raw: String,
        surface: IdSurface,
    ) -> Result<Self> {
        let Identification::Matched {
            model,
            parts,
            basepath: matched_base,
            ..
        } = found
        else {
            return Err(DdrError::InvalidIdentifier { text: raw, surface });
        };
        // Metadata filenames with no components (`collection.json`) name a
        // model but not an object.
        let id = format_id(&parts, model).map_err(|_| DdrError::InvalidIdentifier {
            text: raw.clone(),
            surface,
        })?;
        Ok(Self {
            model,
            parts,
            id,
            basepath: matched_base.or(basepath),
            method,
            raw: Some(raw),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn parts(&self) -> &IdParts {
        &self.parts
    }

    pub fn part(&self, part: IdPart) -> Option<&IdValue> {
        self.parts.get(&part)
    }

    pub fn basepath(&self) -> Option<&Path> {
        self.basepath.as_deref()
    }

    pub fn method(&self) -> IdMethod {
        self.method
    }

    /// The text this identifier was parsed from, if any.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Same object under a different basepath.
    pub fn with_basepath(&self, base_path: &Path) -> Result<Self> {
        let mut i = self.clone();
        i.basepath = check_base_path(Some(base_path))?;
        Ok(i)
    }

    /// Identifier of the object as `model`, keeping only the components
    /// that model's template uses.
    fn truncated(&self, model: Model) -> Option<Self> {
        let wanted = required_parts(model);
        let parts: IdParts = self
            .parts
            .iter()
            .filter(|(part, _)| wanted.contains(part))
            .map(|(part, value)| (*part, value.clone()))
            .collect();
        let id = format_id(&parts, model).ok()?;
        Some(Self {
            model,
            parts,
            id,
            basepath: self.basepath.clone(),
            method: IdMethod::IdParts,
            raw: None,
        })
    }

    pub fn parent(&self) -> Option<Self> {
        self.truncated(self.model.parent()?)
    }

    /// Parent object id, truncating trailing components.
    pub fn parent_id(&self) -> Option<String> {
        self.parent().map(|p| p.id)
    }

    /// The collection this object belongs to (itself for a collection).
    pub fn collection(&self) -> Option<Self> {
        if self.model == Model::Collection {
            return Some(self.clone());
        }
        self.model
            .ancestors()
            .find(|m| *m == Model::Collection)
            .and_then(|m| self.truncated(m))
    }

    pub fn collection_id(&self) -> Option<String> {
        self.collection().map(|c| c.id)
    }

    /// Absolute collection directory, requires a basepath.
    pub fn collection_path(&self) -> Option<PathBuf> {
        let base = self.basepath.as_ref()?;
        Some(base.join(self.collection_id()?))
    }

    pub fn path_abs(&self) -> Option<PathBuf> {
        format_path(&self.parts, self.basepath(), self.model, PathVariant::Abs).map(PathBuf::from)
    }

    /// Path relative to the collection root.
    pub fn path_rel(&self) -> Option<PathBuf> {
        format_path(&self.parts, None, self.model, PathVariant::Rel).map(PathBuf::from)
    }

    pub fn url(&self, style: UrlStyle) -> Option<String> {
        format_url(&self.parts, self.model, style)
    }

    /// Directory the object's metadata files live in. Files keep theirs in
    /// the owning entity's `files/` directory.
    fn metadata_dir(&self, relative: bool) -> Option<PathBuf> {
        match self.model {
            Model::File | Model::FileTmp => {
                let entity = self.parent()?;
                let dir = if relative { entity.path_rel()? } else { entity.path_abs()? };
                Some(dir.join(crate::config::FilenameConfig::FILES_DIR))
            }
            Model::Entity if relative => self.path_rel(),
            Model::Collection | Model::Organization | Model::Repository if relative => {
                Some(PathBuf::new())
            }
            _ => self.path_abs(),
        }
    }

    /// One of the per-model metadata/repository paths.
    ///
    /// Relative paths are relative to the collection root; `None` when the
    /// model has no such file or the absolute form lacks a basepath.
    pub fn additional_path(&self, kind: PathKind, relative: bool) -> Option<PathBuf> {
        let model = match self.model {
            Model::FileTmp => Model::File,
            m => m,
        };
        let filename = format::additional_filename(model, kind, &self.id)?;
        Some(self.metadata_dir(relative)?.join(filename))
    }

    pub fn json_path(&self, relative: bool) -> Option<PathBuf> {
        self.additional_path(PathKind::Json, relative)
    }

    pub fn access_path(&self, relative: bool) -> Option<PathBuf> {
        self.additional_path(PathKind::Access, relative)
    }

    pub fn changelog_path(&self, relative: bool) -> Option<PathBuf> {
        self.additional_path(PathKind::Changelog, relative)
    }

    pub fn control_path(&self, relative: bool) -> Option<PathBuf> {
        self.additional_path(PathKind::Control, relative)
    }

    pub fn files_path(&self, relative: bool) -> Option<PathBuf> {
        self.additional_path(PathKind::Files, relative)
    }

    pub fn annex_path(&self, relative: bool) -> Option<PathBuf> {
        self.additional_path(PathKind::Annex, relative)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

impl FromStr for Identifier {
    type Err = DdrError;

    fn from_str(s: &str) -> Result<Self> {
        Identifier::from_id(s, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/var/www/media/ddr";

    #[test]
    fn test_from_id_models() {
        let cases = [
            ("ddr", Model::Repository),
            ("ddr-testing", Model::Organization),
            ("ddr-testing-123", Model::Collection),
            ("ddr-testing-123-4", Model::Entity),
            ("ddr-testing-123-4-master", Model::FileTmp),
            ("ddr-testing-123-4-master-a1b2c3d4e5", Model::File),
        ];
        for (id, model) in cases {
            let i = Identifier::from_id(id, None).unwrap();
            assert_eq!(i.model(), model, "{}", id);
            assert_eq!(i.id(), id);
            assert_eq!(i.method(), IdMethod::Id);
        }
    }

    #[test]
    fn test_from_id_rejects_garbage() {
        for bad in ["", "ddr-testing-abc", "ddr-testing-123-4-master-abc-extra", "ddr/testing"] {
            let err = Identifier::from_id(bad, None).unwrap_err();
            assert!(matches!(err, DdrError::InvalidIdentifier { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_relative_base_path_rejected() {
        let err = Identifier::from_id("ddr-testing-123", Some(Path::new("media/ddr"))).unwrap_err();
        assert!(matches!(err, DdrError::InvalidArgument { .. }));
    }

    #[test]
    fn test_from_idparts_requires_components() {
        let parts = idparts([(IdPart::Repo, "ddr".into()), (IdPart::Org, "testing".into())]);
        let err = Identifier::from_idparts(parts.clone(), Model::Collection, None).unwrap_err();
        assert!(matches!(err, DdrError::InvalidArgument { .. }));

        let i = Identifier::from_idparts(parts, Model::Organization, None).unwrap();
        assert_eq!(i.id(), "ddr-testing");
        assert_eq!(i.method(), IdMethod::IdParts);
        assert!(i.raw().is_none());
    }

    #[test]
    fn test_from_path_requires_absolute() {
        let err = Identifier::from_path("ddr-testing-123").unwrap_err();
        assert!(matches!(err, DdrError::InvalidArgument { .. }));
    }

    #[test]
    fn test_from_path_strips_trailing_separator() {
        let i = Identifier::from_path("/var/www/media/ddr/ddr-testing-123/").unwrap();
        assert_eq!(i.id(), "ddr-testing-123");
        assert_eq!(i.basepath(), Some(Path::new(BASE)));
    }

    #[test]
    fn test_from_path_file_keeps_extension() {
        let path = "/var/www/media/ddr/ddr-testing-123/files/ddr-testing-123-4/files/ddr-testing-123-4-master-a1b2c3d4e5.jpg";
        let i = Identifier::from_path(path).unwrap();
        assert_eq!(i.model(), Model::File);
        assert_eq!(i.id(), "ddr-testing-123-4-master-a1b2c3d4e5");
        assert_eq!(i.part(IdPart::Ext), Some(&IdValue::Text("jpg".into())));
        assert_eq!(i.path_abs(), Some(PathBuf::from(path)));
    }

    #[test]
    fn test_from_path_metadata_file() {
        let i = Identifier::from_path(
            "/var/www/media/ddr/ddr-testing-123/files/ddr-testing-123-4/entity.json",
        )
        .unwrap();
        assert_eq!(i.model(), Model::Entity);
        assert_eq!(i.id(), "ddr-testing-123-4");
    }

    #[test]
    fn test_from_url_styles() {
        let public = Identifier::from_url("http://ddr.densho.org/ddr/testing/123/456/", None).unwrap();
        assert_eq!(public.id(), "ddr-testing-123-456");
        assert_eq!(public.model(), Model::Entity);

        let editor = Identifier::from_url("http://192.168.56.101/ui/ddr-testing-123-456", None).unwrap();
        assert_eq!(editor.id(), "ddr-testing-123-456");

        let bare = Identifier::from_url("/ddr/testing/123", None).unwrap();
        assert_eq!(bare.model(), Model::Collection);
    }

    #[test]
    fn test_from_url_no_match() {
        assert!(Identifier::from_url("http://ddr.densho.org/", None).is_err());
        assert!(Identifier::from_url("not a url", None).is_err());
    }

    #[test]
    fn test_collection_navigation() {
        let base = Path::new(BASE);
        let i = Identifier::from_id("ddr-testing-123-4-master-a1b2c3d4e5", Some(base)).unwrap();
        assert_eq!(i.collection_id().as_deref(), Some("ddr-testing-123"));
        assert_eq!(
            i.collection_path(),
            Some(PathBuf::from("/var/www/media/ddr/ddr-testing-123"))
        );
        let org = Identifier::from_id("ddr-testing", Some(base)).unwrap();
        assert_eq!(org.collection_id(), None);
        let coll = Identifier::from_id("ddr-testing-123", None).unwrap();
        assert_eq!(coll.collection_id().as_deref(), Some("ddr-testing-123"));
        assert_eq!(coll.collection_path(), None);
    }

    #[test]
    fn test_metadata_paths() {
        let base = Path::new(BASE);
        let entity = Identifier::from_id("ddr-testing-123-4", Some(base)).unwrap();
        assert_eq!(
            entity.json_path(false),
            Some(PathBuf::from(
                "/var/www/media/ddr/ddr-testing-123/files/ddr-testing-123-4/entity.json"
            ))
        );
        assert_eq!(
            entity.control_path(true),
            Some(PathBuf::from("files/ddr-testing-123-4/control"))
        );

        let file = Identifier::from_id("ddr-testing-123-4-master-a1b2c3d4e5", Some(base)).unwrap();
        assert_eq!(
            file.json_path(true),
            Some(PathBuf::from(
                "files/ddr-testing-123-4/files/ddr-testing-123-4-master-a1b2c3d4e5.json"
            ))
        );
        assert_eq!(
            file.access_path(false),
            Some(PathBuf::from(
                "/var/www/media/ddr/ddr-testing-123/files/ddr-testing-123-4/files/ddr-testing-123-4-master-a1b2c3d4e5-a.jpg"
            ))
        );

        let coll = Identifier::from_id("ddr-testing-123", Some(base)).unwrap();
        assert_eq!(coll.json_path(true), Some(PathBuf::from("collection.json")));
        assert_eq!(
            coll.annex_path(false),
            Some(PathBuf::from("/var/www/media/ddr/ddr-testing-123/.git/annex"))
        );
        assert_eq!(coll.changelog_path(false).unwrap().file_name().unwrap(), "changelog");
        assert_eq!(entity.annex_path(false), None);
    }

    #[test]
    fn test_absolute_paths_need_basepath() {
        let entity = Identifier::from_id("ddr-testing-123-4", None).unwrap();
        assert_eq!(entity.json_path(false), None);
        let entity = entity.with_basepath(Path::new(BASE)).unwrap();
        assert!(entity.json_path(false).is_some());
    }

    #[test]
    fn test_display_and_from_str() {
        let i: Identifier = "ddr-testing-123".parse().unwrap();
        assert_eq!(i.to_string(), "ddr-testing-123");
    }

    #[test]
    fn test_model_from_path() {
        assert_eq!(model_from_path("collection.json"), Some(Model::Collection));
        assert_eq!(model_from_path("files/ddr-testing-123-4"), Some(Model::Entity));
        assert_eq!(
            model_from_path("files/ddr-testing-123-4/files/ddr-testing-123-4-master-abc.jpg"),
            Some(Model::File)
        );
        assert_eq!(model_from_path("notes.txt"), None);
    }
}
