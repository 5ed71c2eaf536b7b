use std::path::PathBuf;

/// Source of application descriptors.
pub trait Registry {
    /// Every descriptor the registry knows about, including ones flagged as hidden from menus.
    fn scan(&self) -> Vec<AppInfo>;
}

/// A parsed application descriptor. Owning one is what allows an entry to be launched.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub id: String,             // Desktop file ID (e.g. "org.gnome.Nautilus.desktop")
    pub name: Option<String>,   // Localized Name
    pub icon: Option<String>,   // Icon name or absolute path
    pub exec: Option<String>,   // Unescaped Exec line, field codes still present
    pub working_dir: Option<PathBuf>,
    pub terminal: bool,
    pub source: PathBuf,        // The .desktop file itself
    pub visible: bool,          // NoDisplay / OnlyShowIn / NotShowIn resolved
}

impl AppInfo {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            icon: None,
            exec: None,
            working_dir: None,
            terminal: false,
            source: PathBuf::new(),
            visible: true,
        }
    }

    pub fn should_show(&self) -> bool {
        self.visible
    }
}

pub mod desktop;
pub mod entry;
