use tiny_skia::{Paint, Color, Rect, Transform, PixmapMut, PixmapPaint, PathBuilder, Stroke};
use cosmic_text::{Align, Attrs, Buffer, FontSystem, Metrics, SwashCache};
use crate::model::FALLBACK_ICON;
use crate::state::AppState;
use crate::ui::icons::IconCache;
use crate::ui::layout::{self, GridLayout, LABEL_SIZE};
use crate::config::ThemeConfig;

pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    pub icon_cache: IconCache,
}

impl Renderer {
    pub fn new(icon_cache: IconCache) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            icon_cache,
        }
    }

    pub fn insert_icon(&mut self, name: String, pixmap: Option<tiny_skia::Pixmap>) {
        self.icon_cache.insert(name, pixmap);
    }

    pub fn draw(&mut self, pixmap: &mut PixmapMut, state: &AppState) {
        let theme = &state.config.theme;
        let bg_color = ThemeConfig::parse_color(&theme.background);
        let border_color = ThemeConfig::parse_color(&theme.border_color);
        let text_color = ThemeConfig::parse_color(&theme.text);
        let sel_bg_color = ThemeConfig::parse_color(&theme.selection_background);
        let sel_text_color = ThemeConfig::parse_color(&theme.selection_text);
        let placeholder_color = ThemeConfig::parse_color(&theme.placeholder);

        pixmap.fill(Color::TRANSPARENT);

        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;

        if let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height) {
            self.draw_rounded_rect(pixmap, rect, theme.border_radius, bg_color, Some(border_color));
        }

        let (search_text, search_color) = if state.query.is_empty() {
            ("Search apps...".to_string(), placeholder_color)
        } else {
            (format!("> {}", state.query), text_color)
        };
        self.draw_text(pixmap, &search_text, theme.padding, theme.padding, 20.0, width - 2.0 * theme.padding, None, search_color);

        let grid = GridLayout::new(pixmap.width(), pixmap.height(), theme);
        let scroll_row = grid.scroll_row(state.selected_index);
        let icon_size = theme.icon_size;

        for position in 0..state.filtered_indices.len() {
            let Some((x, y)) = grid.tile_origin(position, scroll_row) else {
                continue;
            };
            let Some(entry) = state.visible_entry(position) else {
                continue;
            };

            let mut label_color = text_color;
            if position == state.selected_index {
                if let Some(tile) = Rect::from_xywh(x + 2.0, y, grid.tile_width - 4.0, grid.tile_height) {
                    self.draw_rounded_rect(pixmap, tile, theme.border_radius / 2.0, sel_bg_color, None);
                }
                label_color = sel_text_color;
            }

            let icon_x = x + (grid.tile_width - icon_size as f32) / 2.0;
            let icon_y = y + theme.spacing;
            self.draw_icon(pixmap, &entry.icon_identifier, icon_size, icon_x, icon_y);

            let label = layout::ellipsize(&entry.display_name, theme.label_max_chars);
            let label_y = icon_y + icon_size as f32 + 4.0;
            self.draw_text(pixmap, &label, x, label_y, LABEL_SIZE, grid.tile_width, Some(Align::Center), label_color);
        }

        if state.filtered_indices.is_empty() {
            self.draw_text(pixmap, "No results found", grid.origin_x, grid.origin_y, 16.0, width - 2.0 * theme.padding, None, Color::from_rgba8(150, 100, 100, 255));
        }
    }

    /// Draws the named icon, or the generic one once the named icon is known to be missing.
    fn draw_icon(&mut self, pixmap: &mut PixmapMut, icon_name: &str, size: u32, x: f32, y: f32) {
        let name = if self.icon_cache.is_missing(icon_name) {
            FALLBACK_ICON
        } else {
            icon_name
        };

        if let Some(icon) = self.icon_cache.get(name, size) {
            pixmap.draw_pixmap(x as i32, y as i32, icon.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        }
    }

    fn draw_rounded_rect(&self, pixmap: &mut PixmapMut, rect: Rect, radius: f32, fill: Color, stroke: Option<Color>) {
        let mut pb = PathBuilder::new();
        let x = rect.left();
        let y = rect.top();
        let w = rect.width();
        let h = rect.height();
        let radius = radius.min(w / 2.0).min(h / 2.0);

        pb.move_to(x + radius, y);
        pb.line_to(x + w - radius, y);
        pb.quad_to(x + w, y, x + w, y + radius);
        pb.line_to(x + w, y + h - radius);
        pb.quad_to(x + w, y + h, x + w - radius, y + h);
        pb.line_to(x + radius, y + h);
        pb.quad_to(x, y + h, x, y + h - radius);
        pb.line_to(x, y + radius);
        pb.quad_to(x, y, x + radius, y);
        pb.close();

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(fill);
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);

            if let Some(s_color) = stroke {
                let mut s_paint = Paint::default();
                s_paint.set_color(s_color);
                s_paint.anti_alias = true;
                let stroke_obj = Stroke { width: 1.5, ..Default::default() };
                pixmap.stroke_path(&path, &s_paint, &stroke_obj, Transform::identity(), None);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, size: f32, max_width: f32, align: Option<Align>, color: Color) {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut self.font_system, Some(max_width.max(1.0)), None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), cosmic_text::Shaping::Advanced);
        for line in buffer.lines.iter_mut() {
            line.set_align(align);
        }
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_color = cosmic_text::Color::rgba(
            (color.red() * 255.0) as u8,
            (color.green() * 255.0) as u8,
            (color.blue() * 255.0) as u8,
            (color.alpha() * 255.0) as u8,
        );

        let (pw, ph) = (pixmap.width() as i32, pixmap.height() as i32);
        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |draw_x, draw_y, w, h, color| {
            let draw_x = draw_x + x as i32;
            let draw_y = draw_y + y as i32;
            if w == 0 || h == 0 { return; }
            if draw_x >= 0 && draw_y >= 0 && draw_x < pw && draw_y < ph {
                let paint = Paint {
                    shader: tiny_skia::Shader::SolidColor(tiny_skia::Color::from_rgba8(color.r(), color.g(), color.b(), color.a())),
                    ..Paint::default()
                };
                if let Some(r) = Rect::from_xywh(draw_x as f32, draw_y as f32, w as f32, h as f32) {
                    pixmap.fill_rect(r, &paint, Transform::identity(), None);
                }
            }
        });
    }
}
