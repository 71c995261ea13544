use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::graph::containment::MAX_CONTAINMENT_DEPTH;

/// Settings snapshot read once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSettings {
    /// Query every site and prefer the requested one; when false, only the
    /// requested site is consulted and relations are limited to edges whose
    /// source site is unset or the requested site.
    #[serde(default = "default_true")]
    pub show_all_sites: bool,
    #[serde(default = "default_true")]
    pub show_thumbnails: bool,
    #[serde(default)]
    pub show_revisions: bool,
    /// Point nested entries at themselves instead of their root owner.
    #[serde(default)]
    pub link_to_nested_element: bool,
    /// Collapse identical entries reached through different containment paths.
    #[serde(default)]
    pub dedupe_entries: bool,
    #[serde(default = "default_cp_base_url")]
    pub cp_base_url: String,
    #[serde(default = "default_max_containment_depth")]
    pub max_containment_depth: usize,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            show_all_sites: default_true(),
            show_thumbnails: default_true(),
            show_revisions: false,
            link_to_nested_element: false,
            dedupe_entries: false,
            cp_base_url: default_cp_base_url(),
            max_containment_depth: default_max_containment_depth(),
        }
    }
}

impl MapSettings {
    /// `cp_base_url` without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.cp_base_url.trim_end_matches('/')
    }
}

/// Project-level settings file relative to a project root.
pub const PROJECT_SETTINGS_PATH: &str = ".elementmap/settings.toml";

/// Parse settings from a TOML file, returning defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings(path: &Path) -> Result<MapSettings> {
    if !path.exists() {
        return Ok(MapSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<MapSettings>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Per-user settings location (`<config dir>/elementmap/settings.toml`).
pub fn user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("elementmap/settings.toml"))
}

/// Resolve the effective settings: the project file wins, then the user
/// file, then built-in defaults.
///
/// # Errors
///
/// Returns an error if a settings file that exists fails to parse.
pub fn resolve_settings(project_root: &Path) -> Result<MapSettings> {
    let project_path = project_root.join(PROJECT_SETTINGS_PATH);
    if project_path.exists() {
        return load_settings(&project_path);
    }

    match user_settings_path() {
        Some(path) if path.exists() => load_settings(&path),
        _ => Ok(MapSettings::default()),
    }
}

const fn default_true() -> bool {
    true
}

fn default_cp_base_url() -> String {
    "/admin".to_string()
}

const fn default_max_containment_depth() -> usize {
    MAX_CONTAINMENT_DEPTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_settings(&dir.path().join("absent.toml")).expect("load should succeed");
        assert_eq!(cfg, MapSettings::default());
        assert!(cfg.show_all_sites);
        assert!(cfg.show_thumbnails);
        assert!(!cfg.show_revisions);
        assert!(!cfg.link_to_nested_element);
        assert!(!cfg.dedupe_entries);
        assert_eq!(cfg.max_containment_depth, MAX_CONTAINMENT_DEPTH);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
show_all_sites = false
show_revisions = true
cp_base_url = "https://cms.example.com/admin/"
"#,
        )
        .expect("write settings");

        let cfg = load_settings(&path).expect("parse");
        assert!(!cfg.show_all_sites);
        assert!(cfg.show_revisions);
        assert!(cfg.show_thumbnails);
        assert_eq!(cfg.base_url(), "https://cms.example.com/admin");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "show_all_sites = \"sometimes\"").expect("write settings");

        let err = load_settings(&path).expect_err("must fail");
        assert!(format!("{err:#}").contains("Failed to parse"), "{err:#}");
    }

    #[test]
    fn project_settings_take_precedence() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings_dir = dir.path().join(".elementmap");
        std::fs::create_dir_all(&settings_dir).expect("create settings dir");
        std::fs::write(settings_dir.join("settings.toml"), "dedupe_entries = true")
            .expect("write settings");

        let cfg = resolve_settings(dir.path()).expect("resolve");
        assert!(cfg.dedupe_entries);
    }
}
