use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::layout_engine::LayoutMode;
use crate::model::workspace::WorkspaceId;

const LAYOUT_MODES: &[&str] = &["horizontal", "vertical", "tabbed", "floating"];

/// `~/.config/tiling-core/config.toml`.
pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".config").join("tiling-core").join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default = "default_mode")]
    pub default_mode: LayoutMode,
    #[serde(default = "default_split_mode")]
    pub split_mode: LayoutMode,
    /// Share of the workspace a floating window without its own geometry
    /// covers, centered.
    #[serde(default = "default_floating_size")]
    pub floating_size: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            split_mode: default_split_mode(),
            floating_size: default_floating_size(),
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.default_mode.is_tiling() {
            issues.push(format!(
                "default_mode must be a tiling mode, got {}",
                self.default_mode
            ));
        }
        if !self.split_mode.is_tiling() {
            issues.push(format!("split_mode must be a tiling mode, got {}", self.split_mode));
        }
        if !(self.floating_size > 0.0 && self.floating_size <= 1.0) {
            issues.push(format!(
                "floating_size must be in (0, 1], got {}",
                self.floating_size
            ));
        }

        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    #[serde(default = "default_workspace")]
    pub default_workspace: WorkspaceId,
    #[serde(default)]
    pub names: Vec<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            default_workspace: default_workspace(),
            names: Vec::new(),
        }
    }
}

impl WorkspaceSettings {
    /// Display name of a workspace: the configured name for its number, or
    /// the number itself.
    pub fn name_for(&self, id: WorkspaceId) -> String {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|idx| self.names.get(idx))
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.default_workspace.0 == 0 {
            issues.push("default_workspace must be at least 1".to_string());
        }
        for (idx, name) in self.names.iter().enumerate() {
            if self.names[..idx].contains(name) && !name.is_empty() {
                issues.push(format!("workspace name {name:?} is used more than once"));
            }
        }

        issues
    }
}

fn default_mode() -> LayoutMode { LayoutMode::Horizontal }

fn default_split_mode() -> LayoutMode { LayoutMode::Vertical }

fn default_floating_size() -> f64 { 0.5 }

fn default_workspace() -> WorkspaceId { WorkspaceId(1) }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// The bundled default configuration.
    pub fn bundled() -> anyhow::Result<Config> {
        Self::parse(include_str!("../../tiling.default.toml"))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.workspaces.validate());
        issues
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(c) => Ok(c),
            Err(e) => {
                let msg = e.to_string();
                match Self::extract_unknown_variant(&msg).and_then(|v| Self::suggest_mode(&v)) {
                    Some(suggestion) => bail!("{msg}\nDid you mean `{suggestion}`?"),
                    None => bail!("{msg}"),
                }
            }
        }
    }

    fn extract_unknown_variant(err: &str) -> Option<String> {
        let start = err.find("unknown variant `")? + "unknown variant `".len();
        let len = err[start..].find('`')?;
        Some(err[start..start + len].to_string())
    }

    fn suggest_mode(unknown: &str) -> Option<&'static str> {
        let unknown = unknown.to_ascii_lowercase();
        LAYOUT_MODES
            .iter()
            .map(|mode| (levenshtein(&unknown, mode), *mode))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, mode)| mode)
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut cur = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        prev = cur;
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bundled_config_matches_defaults() {
        let bundled = Config::bundled().unwrap();
        assert_eq!(bundled, Config::default());
        assert!(bundled.validate().is_empty());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg = Config::parse("[layout]\ndefault_mode = \"tabbed\"\n").unwrap();
        assert_eq!(cfg.layout.default_mode, LayoutMode::Tabbed);
        assert_eq!(cfg.layout.split_mode, LayoutMode::Vertical);
        assert_eq!(cfg.workspaces, WorkspaceSettings::default());
    }

    #[test]
    fn config_file_lives_under_dot_config() {
        assert!(config_file().ends_with(".config/tiling-core/config.toml"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[layout]\ngaps = 4\n").is_err());
    }

    #[test]
    fn misspelled_mode_gets_a_suggestion() {
        let err = Config::parse("[layout]\ndefault_mode = \"horizontl\"\n").unwrap_err();
        assert!(err.to_string().contains("Did you mean `horizontal`?"), "{err}");
    }

    #[test]
    fn validation_reports_every_issue() {
        let mut cfg = Config::default();
        cfg.layout.default_mode = LayoutMode::Floating;
        cfg.layout.floating_size = 1.5;
        cfg.workspaces.default_workspace = WorkspaceId(0);
        cfg.workspaces.names = vec!["web".into(), "web".into()];
        let issues = cfg.validate();
        assert_eq!(issues.len(), 4, "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("default_mode must be a tiling mode")));
        assert!(issues.iter().any(|i| i.contains("used more than once")));
    }

    #[test]
    fn workspace_names_fall_back_to_numbers() {
        let settings = WorkspaceSettings {
            default_workspace: WorkspaceId(1),
            names: vec!["web".into(), String::new()],
        };
        assert_eq!(settings.name_for(WorkspaceId(1)), "web");
        assert_eq!(settings.name_for(WorkspaceId(2)), "2");
        assert_eq!(settings.name_for(WorkspaceId(7)), "7");
    }

    #[test]
    fn save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.layout.split_mode = LayoutMode::Tabbed;
        cfg.workspaces.names = vec!["code".into()];
        cfg.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), cfg);
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("tabed", "tabbed"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
