use crate::command_line;
use crate::config::RegistryConfig;
use crate::registry::entry::{DesktopFile, Locale};
use crate::registry::{AppInfo, Registry};
use directories::BaseDirs;
use log::{debug, info};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// The freedesktop.org desktop entry database.
pub struct DesktopRegistry {
    application_dirs: Vec<PathBuf>,
    current_desktops: Vec<String>,
    locale: Option<Locale>,
    search_path: Vec<PathBuf>,
}

impl DesktopRegistry {
    /// `application_dirs` is in precedence order: a desktop ID found in an earlier
    /// directory shadows the same ID in later ones.
    pub fn new(application_dirs: Vec<PathBuf>) -> Self {
        let search_path = env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();

        Self {
            application_dirs,
            current_desktops: Vec::new(),
            locale: None,
            search_path,
        }
    }

    pub fn with_desktops(mut self, desktops: Vec<String>) -> Self {
        self.current_desktops = desktops;
        self
    }

    pub fn with_locale(mut self, locale: Option<Locale>) -> Self {
        self.locale = locale;
        self
    }

    pub fn from_env(config: &RegistryConfig) -> Self {
        let mut dirs = xdg_application_dirs();
        dirs.extend(config.extra_dirs.iter().cloned());

        let desktops = config
            .desktop
            .clone()
            .or_else(|| env::var("XDG_CURRENT_DESKTOP").ok())
            .map(|value| split_desktops(&value))
            .unwrap_or_default();

        Self::new(dirs)
            .with_desktops(desktops)
            .with_locale(Locale::from_env())
    }

    pub fn application_dirs(&self) -> &[PathBuf] {
        &self.application_dirs
    }

    fn load(&self, id: String, path: &Path) -> Option<AppInfo> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!("Skipping unreadable desktop file {:?}: {}", path, err);
                return None;
            }
        };

        let Some(file) = DesktopFile::parse(&content) else {
            debug!("Skipping {:?}: no [Desktop Entry] group", path);
            return None;
        };

        if file.string("Type").as_deref() != Some("Application") {
            return None;
        }
        if file.boolean("Hidden") {
            debug!("Skipping {}: Hidden=true", id);
            return None;
        }
        if let Some(try_exec) = file.string("TryExec").filter(|s| !s.is_empty()) {
            if !self.find_program(&try_exec) {
                debug!("Skipping {}: TryExec {:?} not found", id, try_exec);
                return None;
            }
        }

        let exec = file.string("Exec").filter(|s| !s.trim().is_empty());
        let working_dir = file
            .string("Path")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        if let Some(exec) = &exec {
            if !self.exec_resolves(exec, working_dir.as_deref()) {
                debug!("Skipping {}: Exec program of {:?} not found", id, exec);
                return None;
            }
        }

        let visible = !file.boolean("NoDisplay") && self.shown_in_current_desktop(&file);

        Some(AppInfo {
            id,
            name: file
                .locale_string("Name", self.locale.as_ref())
                .filter(|s| !s.is_empty()),
            icon: file.string("Icon").filter(|s| !s.is_empty()),
            exec,
            working_dir,
            terminal: file.boolean("Terminal"),
            source: path.to_path_buf(),
            visible,
        })
    }

    /// The first current desktop listed in either `OnlyShowIn` or `NotShowIn` decides.
    fn shown_in_current_desktop(&self, file: &DesktopFile) -> bool {
        let only_show_in = file.list("OnlyShowIn");
        let not_show_in = file.list("NotShowIn");

        for desktop in &self.current_desktops {
            if only_show_in.contains(desktop) {
                return true;
            }
            if not_show_in.contains(desktop) {
                return false;
            }
        }

        only_show_in.is_empty()
    }

    /// The first argument of `exec` must be an executable, either relative to
    /// `working_dir` or found like `TryExec`. Unparsable lines never resolve.
    fn exec_resolves(&self, exec: &str, working_dir: Option<&Path>) -> bool {
        let Ok(argv) = command_line::split_arguments(exec) else {
            return false;
        };
        let Some(program) = argv.first() else {
            return false;
        };

        if let Some(dir) = working_dir {
            if Path::new(program).is_relative() && is_executable(&dir.join(program)) {
                return true;
            }
        }
        self.find_program(program)
    }

    fn find_program(&self, program: &str) -> bool {
        let path = Path::new(program);
        if path.is_absolute() {
            return is_executable(path);
        }
        self.search_path
            .iter()
            .any(|dir| is_executable(&dir.join(program)))
    }
}

impl Registry for DesktopRegistry {
    fn scan(&self) -> Vec<AppInfo> {
        let mut seen = HashSet::new();
        let mut apps = Vec::new();

        for dir in &self.application_dirs {
            if !dir.is_dir() {
                continue;
            }
            debug!("Scanning desktop files in {:?}", dir);

            let walker = WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok());

            for entry in walker {
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|s| s.to_str()) != Some("desktop")
                {
                    continue;
                }

                let Some(id) = desktop_id(dir, path) else {
                    continue;
                };
                // Hidden or broken files still shadow lower-priority copies
                if !seen.insert(id.clone()) {
                    debug!("{} in {:?} is shadowed", id, dir);
                    continue;
                }

                if let Some(app) = self.load(id, path) {
                    apps.push(app);
                }
            }
        }

        info!("DesktopRegistry: found {} entries", apps.len());
        apps
    }
}

/// `applications/org/gnome/Foo.desktop` has the ID `org-gnome-Foo.desktop`.
fn desktop_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(relative.to_str()?.replace('/', "-"))
}

fn xdg_application_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(base_dirs) = BaseDirs::new() {
        dirs.push(base_dirs.data_dir().join("applications"));
    }

    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIRS.to_string());
    for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
        let dir = PathBuf::from(dir).join("applications");
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    dirs
}

fn split_desktops(value: &str) -> Vec<String> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
