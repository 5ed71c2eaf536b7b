use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, channel};
use std::thread;
use image::ImageReader;
use log::debug;
use tiny_skia::{Pixmap, Transform};

const THEMES: [&str; 2] = ["hicolor", "Adwaita"];
const SIZE_DIRS: [&str; 6] = ["48x48", "scalable", "64x64", "128x128", "32x32", "256x256"];
const EXTENSIONS: [&str; 3] = ["png", "svg", "xpm"];

/// Decoded icons keyed by icon identifier. Lookups are answered asynchronously:
/// a miss queues a load and the result arrives on the calloop channel.
pub struct IconCache {
    cache: HashMap<String, Option<Pixmap>>,
    pending: HashSet<String>,
    request_tx: Sender<(String, u32)>,
}

impl IconCache {
    pub fn new(response_tx: calloop::channel::Sender<(String, Option<Pixmap>)>) -> Self {
        let roots = icon_roots();
        debug!("Icon search roots: {:?}", roots);

        let (request_tx, request_rx) = channel::<(String, u32)>();
        thread::spawn(move || {
            while let Ok((icon_name, size)) = request_rx.recv() {
                let pixmap = find_icon(&icon_name, &roots).and_then(|path| load_icon(&path, size));
                if response_tx.send((icon_name, pixmap)).is_err() {
                    break;
                }
            }
        });

        Self {
            cache: HashMap::new(),
            pending: HashSet::new(),
            request_tx,
        }
    }

    pub fn get(&mut self, icon_name: &str, size: u32) -> Option<&Pixmap> {
        if !self.cache.contains_key(icon_name) && self.pending.insert(icon_name.to_string()) {
            let _ = self.request_tx.send((icon_name.to_string(), size));
        }
        self.cache.get(icon_name).and_then(Option::as_ref)
    }

    /// `true` once a load for `icon_name` finished without finding anything.
    pub fn is_missing(&self, icon_name: &str) -> bool {
        matches!(self.cache.get(icon_name), Some(None))
    }

    pub fn insert(&mut self, name: String, pixmap: Option<Pixmap>) {
        self.pending.remove(&name);
        self.cache.insert(name, pixmap);
    }
}

/// `$XDG_DATA_HOME/icons`, `~/.icons`, every `$XDG_DATA_DIRS/icons`, then pixmaps.
fn icon_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(base) = directories::BaseDirs::new() {
        roots.push(base.data_dir().join("icons"));
        roots.push(base.home_dir().join(".icons"));
    }
    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
        roots.push(PathBuf::from(dir).join("icons"));
    }
    roots.push(PathBuf::from("/usr/share/pixmaps"));
    roots
}

/// Resolves an icon identifier to a file. Absolute paths are used as-is.
pub fn find_icon(icon_name: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let path = Path::new(icon_name);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    for root in roots.iter().filter(|r| r.is_dir()) {
        let themed = THEMES
            .iter()
            .flat_map(move |theme| SIZE_DIRS.iter().map(move |size| root.join(theme).join(size).join("apps")));

        for dir in themed.chain(std::iter::once(root.clone())) {
            for ext in EXTENSIONS {
                let file_path = dir.join(format!("{}.{}", icon_name, ext));
                if file_path.is_file() {
                    return Some(file_path);
                }
            }
        }
    }
    None
}

fn load_icon(path: &Path, size: u32) -> Option<Pixmap> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("svg") => load_svg(path, size),
        _ => load_raster(path, size),
    }
}

fn load_raster(path: &Path, size: u32) -> Option<Pixmap> {
    let img = ImageReader::open(path).ok()?.with_guessed_format().ok()?.decode().ok()?;
    let img = img.resize(size, size, image::imageops::FilterType::Lanczos3);
    let mut rgba = img.into_rgba8();

    // tiny-skia wants premultiplied alpha
    for pixel in rgba.chunks_exact_mut(4) {
        let a = pixel[3] as f32 / 255.0;
        pixel[0] = (pixel[0] as f32 * a) as u8;
        pixel[1] = (pixel[1] as f32 * a) as u8;
        pixel[2] = (pixel[2] as f32 * a) as u8;
    }

    let width = rgba.width();
    let height = rgba.height();
    Pixmap::from_vec(rgba.into_vec(), tiny_skia::IntSize::from_wh(width, height)?)
}

fn load_svg(path: &Path, size: u32) -> Option<Pixmap> {
    let opt = resvg::usvg::Options::default();
    let svg_data = fs::read(path).ok()?;
    let tree = resvg::usvg::Tree::from_data(&svg_data, &opt).ok()?;

    let mut pixmap = Pixmap::new(size, size)?;
    let transform = Transform::from_scale(
        size as f32 / tree.size().width(),
        size as f32 / tree.size().height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Some(pixmap)
}
