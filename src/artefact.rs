//! Artefact routing metadata.
//!
//! # Responsibilities
//! - Describe which application renders a piece of content
//! - List the exact paths and path prefixes it owns
//! - Load batches of artefacts for a full re-sync
//!
//! # Design Decisions
//! - Missing path lists deserialize as empty, never as an error
//! - Blank (whitespace-only) app names count as absent

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unit of published content with routing metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Artefact {
    /// Human readable identifier, used for logging only.
    pub slug: Option<String>,

    /// Application that renders this content.
    pub rendering_app: Option<String>,

    /// Application that owns this content (fallback rendering target).
    pub owning_app: Option<String>,

    /// Exact-match paths, in declared order.
    #[serde(deserialize_with = "null_as_empty")]
    pub paths: Vec<String>,

    /// Path prefixes, in declared order.
    #[serde(deserialize_with = "null_as_empty")]
    pub prefixes: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The artefact names no application to route to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("artefact {label} has neither a rendering_app nor an owning_app")]
pub struct ResolutionError {
    pub label: String,
}

impl Artefact {
    /// Resolve the application routes should point at.
    ///
    /// `rendering_app` wins whenever it is present and non-blank, otherwise
    /// `owning_app` is used.
    pub fn resolve_rendering_app(&self) -> Result<&str, ResolutionError> {
        [self.rendering_app.as_deref(), self.owning_app.as_deref()]
            .into_iter()
            .flatten()
            .find(|app| !app.trim().is_empty())
            .ok_or_else(|| ResolutionError {
                label: self.label(),
            })
    }

    /// Label used in logs and error reports.
    pub fn label(&self) -> String {
        match (&self.slug, self.paths.first(), self.prefixes.first()) {
            (Some(slug), _, _) if !slug.trim().is_empty() => slug.clone(),
            (_, Some(path), _) => path.clone(),
            (_, None, Some(prefix)) => prefix.clone(),
            _ => "<unnamed>".to_string(),
        }
    }
}

/// Error type for manifest loading.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A set of artefacts whose routes should be kept registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtefactManifest {
    #[serde(rename = "artefact", alias = "artefacts")]
    pub artefacts: Vec<Artefact>,
}

impl ArtefactManifest {
    /// Load a manifest, choosing the format from the file extension.
    ///
    /// `.json` files are parsed as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        parse_file(path)
    }
}

/// Load a single artefact definition from a TOML or JSON file.
pub fn load_artefact(path: &Path) -> Result<Artefact, ManifestError> {
    parse_file(path)
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artefact(rendering: Option<&str>, owning: Option<&str>) -> Artefact {
        Artefact {
            rendering_app: rendering.map(String::from),
            owning_app: owning.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_rendering_app_wins() {
        let a = artefact(Some("frontend"), Some("publisher"));
        assert_eq!(a.resolve_rendering_app().unwrap(), "frontend");
    }

    #[test]
    fn test_falls_back_to_owning_app() {
        assert_eq!(
            artefact(None, Some("publisher")).resolve_rendering_app().unwrap(),
            "publisher"
        );
        assert_eq!(
            artefact(Some("  "), Some("publisher")).resolve_rendering_app().unwrap(),
            "publisher"
        );
    }

    #[test]
    fn test_unresolvable_when_both_blank() {
        let mut a = artefact(Some(""), None);
        a.slug = Some("vat-rates".into());
        let err = a.resolve_rendering_app().unwrap_err();
        assert_eq!(err.label, "vat-rates");
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let a: Artefact = serde_json::from_str(r#"{"rendering_app":"frontend"}"#).unwrap();
        assert!(a.paths.is_empty());
        assert!(a.prefixes.is_empty());

        let a: Artefact =
            serde_json::from_str(r#"{"rendering_app":"frontend","paths":null}"#).unwrap();
        assert!(a.paths.is_empty());
    }

    #[test]
    fn test_manifest_from_toml() {
        let manifest: ArtefactManifest = toml::from_str(
            r#"
            [[artefact]]
            slug = "vat-rates"
            rendering_app = "frontend"
            paths = ["/vat-rates"]

            [[artefact]]
            owning_app = "whitehall"
            prefixes = ["/government"]
            "#,
        )
        .unwrap();
        assert_eq!(manifest.artefacts.len(), 2);
        assert_eq!(manifest.artefacts[1].prefixes, vec!["/government"]);
    }
}
