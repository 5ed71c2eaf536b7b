use crate::error::ConfigError;
use directories::ProjectDirs;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tiny_skia::Color;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    /// Command prefix for `Terminal=true` entries, e.g. "foot -e".
    #[serde(default)]
    pub terminal: Option<String>,
    #[serde(default = "default_true")]
    pub close_on_focus_loss: bool,
}

fn default_true() -> bool { true }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            terminal: None,
            close_on_focus_loss: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Extra `applications` directories, searched after the XDG ones.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
    /// Overrides `XDG_CURRENT_DESKTOP` for OnlyShowIn/NotShowIn.
    #[serde(default)]
    pub desktop: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThemeConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_selection_background")]
    pub selection_background: String,
    #[serde(default = "default_selection_text")]
    pub selection_text: String,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_width() -> u32 { 600 }
fn default_height() -> u32 { 400 }
fn default_columns() -> usize { 5 }
fn default_icon_size() -> u32 { 48 }
fn default_label_max_chars() -> usize { 10 }
fn default_padding() -> f32 { 20.0 }
fn default_spacing() -> f32 { 10.0 }
fn default_border_radius() -> f32 { 12.0 }
fn default_background() -> String { "1e1e1eff".to_string() }
fn default_border_color() -> String { "3c3c50ff".to_string() }
fn default_text() -> String { "c8c8c8ff".to_string() }
fn default_selection_background() -> String { "3c3c50ff".to_string() }
fn default_selection_text() -> String { "ffffffff".to_string() }
fn default_placeholder() -> String { "646464ff".to_string() }

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            columns: default_columns(),
            icon_size: default_icon_size(),
            label_max_chars: default_label_max_chars(),
            padding: default_padding(),
            spacing: default_spacing(),
            border_radius: default_border_radius(),
            background: default_background(),
            border_color: default_border_color(),
            text: default_text(),
            selection_background: default_selection_background(),
            selection_text: default_selection_text(),
            placeholder: default_placeholder(),
        }
    }
}

impl ThemeConfig {
    /// Parses `RRGGBBAA`, with or without a leading `#`. Anything else is black.
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 8 || !hex.is_ascii() {
            return Color::BLACK;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        let a = u8::from_str_radix(&hex[6..8], 16).unwrap_or(255);

        Color::from_rgba8(r, g, b, a)
    }

    pub fn columns(&self) -> usize {
        self.columns.max(1)
    }
}

pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("org", "tiles", "tiles") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Loads `path`, or the default location when `None`. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        debug!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: config_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(Some(&dir.path().join("config.toml"))).unwrap();

        assert!(config.general.close_on_focus_loss);
        assert_eq!(config.general.terminal, None);
        assert!(config.registry.extra_dirs.is_empty());
        assert_eq!(config.theme.width, 600);
        assert_eq!(config.theme.height, 400);
        assert_eq!(config.theme.columns, 5);
        assert_eq!(config.theme.icon_size, 48);
        assert_eq!(config.theme.label_max_chars, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
                [general]
                terminal = "foot -e"
                close_on_focus_loss = false

                [registry]
                extra_dirs = ["/opt/apps/share/applications"]
                desktop = "sway"

                [theme]
                columns = 4
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.general.terminal.as_deref(), Some("foot -e"));
        assert!(!config.general.close_on_focus_loss);
        assert_eq!(config.registry.extra_dirs, vec![PathBuf::from("/opt/apps/share/applications")]);
        assert_eq!(config.registry.desktop.as_deref(), Some("sway"));
        assert_eq!(config.theme.columns, 4);
        assert_eq!(config.theme.width, 600);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[theme]\ncolumns = \"many\"\n").unwrap();

        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn zero_columns_is_treated_as_one() {
        let theme = ThemeConfig { columns: 0, ..ThemeConfig::default() };
        assert_eq!(theme.columns(), 1);
    }

    #[test]
    fn parses_colors() {
        let color = ThemeConfig::parse_color("#ff000080");
        assert_eq!(color.red(), 1.0);
        assert_eq!(color.green(), 0.0);
        assert!((color.alpha() - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(ThemeConfig::parse_color("fff"), Color::BLACK);
    }
}
