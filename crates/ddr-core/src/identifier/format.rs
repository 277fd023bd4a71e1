//! Templates for rendering ids, paths, URLs and metadata filenames.

use super::parts::{IdPart, IdParts};
use crate::error::{DdrError, Result};
use crate::hierarchy::Model;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

const ID_FORMATS: &[(Model, &str)] = &[
    (Model::File, "{repo}-{org}-{cid}-{eid}-{role}-{sha1}"),
    (Model::FileTmp, "{repo}-{org}-{cid}-{eid}-{role}"),
    (Model::Entity, "{repo}-{org}-{cid}-{eid}"),
    (Model::Collection, "{repo}-{org}-{cid}"),
    (Model::Organization, "{repo}-{org}"),
    (Model::Repository, "{repo}"),
];

/// Which flavour of path to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathVariant {
    /// Absolute, rooted at the basepath.
    Abs,
    /// Relative to the collection root.
    Rel,
}

const PATH_FORMATS: &[(Model, PathVariant, &str)] = &[
    (
        Model::File,
        PathVariant::Abs,
        "{basepath}/{repo}-{org}-{cid}/files/{repo}-{org}-{cid}-{eid}/files/{repo}-{org}-{cid}-{eid}-{role}-{sha1}.{ext}",
    ),
    (
        Model::File,
        PathVariant::Rel,
        "files/{repo}-{org}-{cid}-{eid}/files/{repo}-{org}-{cid}-{eid}-{role}-{sha1}.{ext}",
    ),
    (
        Model::Entity,
        PathVariant::Abs,
        "{basepath}/{repo}-{org}-{cid}/files/{repo}-{org}-{cid}-{eid}",
    ),
    (Model::Entity, PathVariant::Rel, "files/{repo}-{org}-{cid}-{eid}"),
    (Model::Collection, PathVariant::Abs, "{basepath}/{repo}-{org}-{cid}"),
    (Model::Organization, PathVariant::Abs, "{basepath}/{repo}-{org}"),
    (Model::Repository, PathVariant::Abs, "{basepath}/{repo}"),
];

/// The two URL styles in circulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStyle {
    /// Editing workstation: `/ui/ddr-testing-123-4`
    Editor,
    /// Public site: `/ddr/testing/123/4`
    Public,
}

const URL_FORMATS: &[(Model, UrlStyle, &str)] = &[
    (Model::File, UrlStyle::Editor, "/ui/{repo}-{org}-{cid}-{eid}-{role}-{sha1}"),
    (Model::FileTmp, UrlStyle::Editor, "/ui/{repo}-{org}-{cid}-{eid}-{role}"),
    (Model::Entity, UrlStyle::Editor, "/ui/{repo}-{org}-{cid}-{eid}"),
    (Model::Collection, UrlStyle::Editor, "/ui/{repo}-{org}-{cid}"),
    (Model::Organization, UrlStyle::Editor, "/ui/{repo}-{org}"),
    (Model::Repository, UrlStyle::Editor, "/ui/{repo}"),
    (Model::File, UrlStyle::Public, "/{repo}/{org}/{cid}/{eid}/{role}/{sha1}"),
    (Model::FileTmp, UrlStyle::Public, "/{repo}/{org}/{cid}/{eid}/{role}"),
    (Model::Entity, UrlStyle::Public, "/{repo}/{org}/{cid}/{eid}"),
    (Model::Collection, UrlStyle::Public, "/{repo}/{org}/{cid}"),
    (Model::Organization, UrlStyle::Public, "/{repo}/{org}"),
    (Model::Repository, UrlStyle::Public, "/{repo}"),
];

/// Metadata and repository files that hang off an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Json,
    Access,
    Changelog,
    Control,
    Files,
    Gitignore,
    Git,
    Annex,
}

const ADDITIONAL_PATHS: &[(Model, PathKind, &str)] = &[
    (Model::File, PathKind::Json, "{id}.json"),
    (Model::File, PathKind::Access, "{id}-a.jpg"),
    (Model::Entity, PathKind::Json, "entity.json"),
    (Model::Entity, PathKind::Changelog, "changelog"),
    (Model::Entity, PathKind::Control, "control"),
    (Model::Entity, PathKind::Files, "files"),
    (Model::Collection, PathKind::Json, "collection.json"),
    (Model::Collection, PathKind::Changelog, "changelog"),
    (Model::Collection, PathKind::Control, "control"),
    (Model::Collection, PathKind::Files, "files"),
    (Model::Collection, PathKind::Gitignore, ".gitignore"),
    (Model::Collection, PathKind::Git, ".git"),
    (Model::Collection, PathKind::Annex, ".git/annex"),
    (Model::Organization, PathKind::Json, "organization.json"),
    (Model::Repository, PathKind::Json, "repository.json"),
];

/// Substitute `{name}` placeholders; `None` if any name has no value.
fn render(template: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let mut out = String::with_capacity(template.len() * 2);
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0)?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&lookup(&caps[1])?);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Some(out)
}

fn part_lookup<'a>(parts: &'a IdParts) -> impl Fn(&str) -> Option<String> + 'a {
    move |name: &str| {
        IdPart::from_name(name)
            .and_then(|part| parts.get(&part))
            .map(|value| value.to_string())
    }
}

pub(crate) fn id_template(model: Model) -> &'static str {
    ID_FORMATS
        .iter()
        .find(|(m, _)| *m == model)
        .map(|(_, tpl)| *tpl)
        .unwrap_or_default()
}

/// Components the id template for `model` needs.
pub fn required_parts(model: Model) -> Vec<IdPart> {
    PLACEHOLDER
        .captures_iter(id_template(model))
        .filter_map(|caps| IdPart::from_name(&caps[1]))
        .collect()
}

/// Render the canonical id string for `model`.
///
/// Fails with `InvalidArgument` naming the first missing component.
pub fn format_id(parts: &IdParts, model: Model) -> Result<String> {
    if let Some(missing) = required_parts(model)
        .into_iter()
        .find(|part| !parts.contains_key(part))
    {
        return Err(DdrError::invalid_argument(format!(
            "{} id requires component '{}'",
            model, missing
        )));
    }
    render(id_template(model), part_lookup(parts)).ok_or_else(|| {
        DdrError::invalid_argument(format!("could not render {} id", model))
    })
}

/// Render a path for `(model, variant)`.
///
/// `None` when the model has no template for the variant or a placeholder
/// has no value; an unsupported variant is a normal outcome.
pub fn format_path(
    parts: &IdParts,
    basepath: Option<&Path>,
    model: Model,
    variant: PathVariant,
) -> Option<String> {
    let (_, _, template) = PATH_FORMATS
        .iter()
        .find(|(m, v, _)| *m == model && *v == variant)?;
    let lookup = part_lookup(parts);
    render(template, |name| {
        if name == "basepath" {
            basepath.map(|p| p.to_string_lossy().trim_end_matches('/').to_string())
        } else {
            lookup(name)
        }
    })
}

/// Render the URL path for `model` in the given style.
pub fn format_url(parts: &IdParts, model: Model, style: UrlStyle) -> Option<String> {
    let (_, _, template) = URL_FORMATS
        .iter()
        .find(|(m, s, _)| *m == model && *s == style)?;
    render(template, part_lookup(parts))
}

/// Filename of an additional path for `model`, `{id}` substituted.
pub(crate) fn additional_filename(model: Model, kind: PathKind, id: &str) -> Option<String> {
    let (_, _, template) = ADDITIONAL_PATHS
        .iter()
        .find(|(m, k, _)| *m == model && *k == kind)?;
    render(template, |name| (name == "id").then(|| id.to_string()))
}
