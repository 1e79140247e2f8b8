//! View configuration table loader/writer.
//!
//! The table is an ordered list of view declarations plus a few manager
//! settings. It is authored as TOML, but tables exported by external tools
//! as JSON (including their camelCase field names) load unchanged.

use crate::bridge::Placement;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod validator;

// Embed default table at compile time
const DEFAULT_VIEWS: &str = include_str!("../defaults/views.toml");

/// Static declaration of one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfigEntry {
    #[serde(alias = "viewName")]
    pub view_name: String,
    /// Logical type identifier, e.g. "Game.ViewStart"
    #[serde(alias = "className", alias = "classBinding")]
    pub class_binding: String,
    #[serde(alias = "prefabPath", alias = "assetPath")]
    pub asset_path: String,
    #[serde(default, alias = "isLoading", alias = "isLoadingView")]
    pub is_loading_view: bool,
    #[serde(default, alias = "debugMaskAlpha")]
    pub debug_mask_alpha: f32,
    #[serde(default, alias = "canCloseByEsc", alias = "canCloseByEscape")]
    pub can_close_by_escape: bool,
}

impl ViewConfigEntry {
    pub fn new(view_name: &str, class_binding: &str, asset_path: &str) -> Self {
        Self {
            view_name: view_name.to_string(),
            class_binding: class_binding.to_string(),
            asset_path: asset_path.to_string(),
            is_loading_view: false,
            debug_mask_alpha: 0.0,
            can_close_by_escape: false,
        }
    }

    pub fn loading(mut self) -> Self {
        self.is_loading_view = true;
        self
    }

    pub fn with_debug_alpha(mut self, alpha: f32) -> Self {
        self.debug_mask_alpha = alpha;
        self
    }

    pub fn closable_by_escape(mut self) -> Self {
        self.can_close_by_escape = true;
        self
    }
}

/// Settings for bootstrapping the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSettings {
    #[serde(default = "default_bootstrap_asset")]
    pub bootstrap_asset: String,
    /// How long a message stays up when its channel has no animation
    #[serde(default = "default_message_hold_secs")]
    pub message_hold_secs: f32,
    #[serde(default)]
    pub root_placement: Placement,
}

fn default_bootstrap_asset() -> String {
    "UI/ViewRoot".to_string()
}

fn default_message_hold_secs() -> f32 {
    1.0
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            bootstrap_asset: default_bootstrap_asset(),
            message_hold_secs: default_message_hold_secs(),
            root_placement: Placement::default(),
        }
    }
}

impl ManagerSettings {
    /// Fallback display time for messages. Values that are negative, NaN or
    /// too large for a `Duration` fall back to the default hold.
    pub fn message_hold(&self) -> Duration {
        match Duration::try_from_secs_f32(self.message_hold_secs) {
            Ok(hold) => hold,
            Err(_) => {
                let fallback = default_message_hold_secs();
                tracing::warn!(
                    "message_hold_secs {} is not a usable duration; using {}s",
                    self.message_hold_secs,
                    fallback
                );
                Duration::from_secs_f32(fallback)
            }
        }
    }
}

/// The persisted configuration table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewTable {
    #[serde(default)]
    pub manager: ManagerSettings,
    #[serde(default)]
    pub views: Vec<ViewConfigEntry>,
}

/// JSON exports come either as a bare list or as a full table.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTable {
    List(Vec<ViewConfigEntry>),
    Table(ViewTable),
}

impl ViewTable {
    /// The table compiled into the binary.
    pub fn embedded_default() -> Result<Self> {
        Self::parse_toml(DEFAULT_VIEWS).context("Embedded default view table is invalid")
    }

    pub fn parse_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse view table TOML")
    }

    pub fn parse_json(contents: &str) -> Result<Self> {
        let parsed: JsonTable =
            serde_json::from_str(contents).context("Failed to parse view table JSON")?;
        Ok(match parsed {
            JsonTable::List(views) => ViewTable {
                manager: ManagerSettings::default(),
                views,
            },
            JsonTable::Table(table) => table,
        })
    }

    /// Load a table, picking the format from the file extension (TOML unless `.json`).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read view table: {}", path.display()))?;

        let table = if is_json(path) {
            Self::parse_json(&contents)
        } else {
            Self::parse_toml(&contents)
        }
        .with_context(|| format!("Invalid view table: {}", path.display()))?;

        tracing::info!(
            "Loaded {} view entries from {}",
            table.views.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load the table from the data directory, extracting defaults on first run.
    pub fn load() -> Result<Self> {
        let path = Self::extract_defaults()?;
        Self::load_from_file(&path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = if is_json(path) {
            serde_json::to_string_pretty(self).context("Failed to serialize view table")?
        } else {
            toml::to_string_pretty(self).context("Failed to serialize view table")?
        };
        fs::write(path, contents)
            .with_context(|| format!("Failed to write view table: {}", path.display()))?;
        Ok(())
    }

    /// Write the embedded table to the data directory unless one exists.
    /// Returns the table path either way.
    pub fn extract_defaults() -> Result<PathBuf> {
        let path = Self::table_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create data directory")?;
            }
            fs::write(&path, DEFAULT_VIEWS).context("Failed to write default view table")?;
            tracing::info!("Extracted default view table to {}", path.display());
        }
        Ok(path)
    }

    /// Get the base directory (~/.viewstack/)
    /// Can be overridden with VIEWSTACK_DIR environment variable
    pub fn base_dir() -> Result<PathBuf> {
        if let Ok(custom_dir) = std::env::var("VIEWSTACK_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".viewstack"))
    }

    /// Returns: ~/.viewstack/views.toml
    pub fn table_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("views.toml"))
    }

    pub fn find(&self, view_name: &str) -> Option<&ViewConfigEntry> {
        self.views.iter().find(|v| v.view_name == view_name)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_parses() {
        let table = ViewTable::embedded_default().expect("default table");
        assert_eq!(table.manager.bootstrap_asset, "UI/ViewRoot");
        assert_eq!(table.manager.root_placement.x, 5000.0);

        let loading = table.find("Loading").expect("loading entry");
        assert!(loading.is_loading_view);
        assert!(!table.find("Start").unwrap().can_close_by_escape);
    }

    #[test]
    fn test_toml_optional_fields_default() {
        let table = ViewTable::parse_toml(
            r#"
[[views]]
view_name = "Start"
class_binding = "Game.ViewStart"
asset_path = "UI/Start"
"#,
        )
        .unwrap();

        assert_eq!(table.manager, ManagerSettings::default());
        let entry = &table.views[0];
        assert!(!entry.is_loading_view);
        assert_eq!(entry.debug_mask_alpha, 0.0);
        assert!(!entry.can_close_by_escape);
    }

    #[test]
    fn test_json_export_with_camel_case_fields() {
        let table = ViewTable::parse_json(
            r#"[
                {"viewName": "Start", "className": "Game.ViewStart", "prefabPath": "UI/Start",
                 "isLoading": false, "debugMaskAlpha": 0.25, "canCloseByEsc": true},
                {"viewName": "Loading", "className": "Game.ViewLoading", "prefabPath": "UI/Loading",
                 "isLoading": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(table.views.len(), 2);
        assert_eq!(table.views[0].debug_mask_alpha, 0.25);
        assert!(table.views[0].can_close_by_escape);
        assert!(table.views[1].is_loading_view);
        assert_eq!(table.manager.message_hold(), Duration::from_secs(1));
    }

    #[test]
    fn test_json_full_table() {
        let table = ViewTable::parse_json(
            r#"{"manager": {"bootstrap_asset": "UI/Root", "message_hold_secs": 2.5},
                "views": [{"view_name": "A", "class_binding": "A", "asset_path": "UI/A"}]}"#,
        )
        .unwrap();

        assert_eq!(table.manager.bootstrap_asset, "UI/Root");
        assert_eq!(table.manager.message_hold(), Duration::from_millis(2500));
        assert_eq!(table.views[0].view_name, "A");
    }

    #[test]
    fn test_unusable_message_hold_falls_back() {
        let table = ViewTable::parse_toml("[manager]\nmessage_hold_secs = inf\n").unwrap();
        assert_eq!(table.manager.message_hold_secs, f32::INFINITY);
        assert_eq!(table.manager.message_hold(), Duration::from_secs(1));

        for secs in [f32::NAN, -2.0, 1.0e30] {
            let settings = ManagerSettings {
                message_hold_secs: secs,
                ..ManagerSettings::default()
            };
            assert_eq!(settings.message_hold(), Duration::from_secs(1));
        }

        let zero = ManagerSettings {
            message_hold_secs: 0.0,
            ..ManagerSettings::default()
        };
        assert_eq!(zero.message_hold(), Duration::ZERO);
    }

    #[test]
    fn test_save_and_reload_both_formats() {
        let dir = std::env::temp_dir().join(format!("viewstack-config-{}", std::process::id()));
        let table = ViewTable {
            manager: ManagerSettings::default(),
            views: vec![
                ViewConfigEntry::new("Shop", "Game.ViewShop", "UI/Shop")
                    .with_debug_alpha(0.3)
                    .closable_by_escape(),
            ],
        };

        for name in ["views.toml", "views.json"] {
            let path = dir.join(name);
            table.save(&path).expect("save");
            let loaded = ViewTable::load_from_file(&path).expect("reload");
            assert_eq!(loaded, table);
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let result = ViewTable::parse_toml(
            r#"
[[views]]
view_name = "Start"
"#,
        );
        assert!(result.is_err());
    }
}
