use crate::config::ThemeConfig;

pub const SEARCH_HEIGHT: f32 = 20.0;
pub const LABEL_SIZE: f32 = 14.0;
const LABEL_HEIGHT: f32 = 18.0;

/// Geometry of the tile grid below the search line.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub columns: usize,
    pub visible_rows: usize,
}

impl GridLayout {
    pub fn new(width: u32, height: u32, theme: &ThemeConfig) -> Self {
        let columns = theme.columns();
        let origin_x = theme.padding;
        let origin_y = theme.padding + SEARCH_HEIGHT + theme.spacing;

        let inner_width = (width as f32 - 2.0 * theme.padding).max(columns as f32);
        let tile_width = inner_width / columns as f32;
        let tile_height = theme.icon_size as f32 + LABEL_HEIGHT + 2.0 * theme.spacing;

        let available = (height as f32 - origin_y - theme.padding).max(0.0);
        let visible_rows = ((available / tile_height) as usize).max(1);

        Self {
            origin_x,
            origin_y,
            tile_width,
            tile_height,
            columns,
            visible_rows,
        }
    }

    /// First row drawn so that the row holding `selected` stays on screen.
    pub fn scroll_row(&self, selected: usize) -> usize {
        let row = selected / self.columns;
        row.saturating_sub(self.visible_rows - 1)
    }

    /// Top-left corner of the tile at `position`, if it is on screen.
    pub fn tile_origin(&self, position: usize, scroll_row: usize) -> Option<(f32, f32)> {
        let row = (position / self.columns).checked_sub(scroll_row)?;
        if row >= self.visible_rows {
            return None;
        }
        let column = position % self.columns;
        Some((
            self.origin_x + column as f32 * self.tile_width,
            self.origin_y + row as f32 * self.tile_height,
        ))
    }

    /// Position of the tile under the given surface coordinates.
    pub fn hit_test(&self, x: f64, y: f64, scroll_row: usize) -> Option<usize> {
        let dx = x as f32 - self.origin_x;
        let dy = y as f32 - self.origin_y;
        if dx < 0.0 || dy < 0.0 {
            return None;
        }

        let column = (dx / self.tile_width) as usize;
        let row = (dy / self.tile_height) as usize;
        if column >= self.columns || row >= self.visible_rows {
            return None;
        }

        Some((scroll_row + row) * self.columns + column)
    }
}

/// Truncates to `max_chars` characters, marking the cut with an ellipsis.
pub fn ellipsize(label: &str, max_chars: usize) -> String {
    if max_chars == 0 || label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        GridLayout::new(600, 400, &ThemeConfig::default())
    }

    #[test]
    fn default_theme_geometry() {
        let grid = layout();
        assert_eq!(grid.columns, 5);
        assert_eq!(grid.tile_width, 112.0);
        assert_eq!(grid.origin_y, 50.0);
        assert_eq!(grid.tile_height, 86.0);
        assert_eq!(grid.visible_rows, 3);
    }

    #[test]
    fn scrolls_to_keep_selection_visible() {
        let grid = layout();
        assert_eq!(grid.scroll_row(0), 0);
        assert_eq!(grid.scroll_row(14), 0);
        assert_eq!(grid.scroll_row(15), 1);
        assert_eq!(grid.scroll_row(29), 3);
    }

    #[test]
    fn tile_origins() {
        let grid = layout();
        assert_eq!(grid.tile_origin(0, 0), Some((20.0, 50.0)));
        assert_eq!(grid.tile_origin(6, 0), Some((132.0, 136.0)));
        assert_eq!(grid.tile_origin(15, 0), None);
        assert_eq!(grid.tile_origin(2, 1), None);
        assert_eq!(grid.tile_origin(15, 1), Some((20.0, 222.0)));
    }

    #[test]
    fn hit_testing() {
        let grid = layout();
        assert_eq!(grid.hit_test(140.0, 140.0, 0), Some(6));
        assert_eq!(grid.hit_test(140.0, 140.0, 2), Some(16));
        assert_eq!(grid.hit_test(10.0, 140.0, 0), None);
        assert_eq!(grid.hit_test(140.0, 30.0, 0), None);
        assert_eq!(grid.hit_test(590.0, 60.0, 0), None);
        assert_eq!(grid.hit_test(140.0, 399.0, 0), None);
    }

    #[test]
    fn ellipsizes_long_labels() {
        assert_eq!(ellipsize("Files", 10), "Files");
        assert_eq!(ellipsize("LibreOffice Writer", 10), "LibreOffi…");
        assert_eq!(ellipsize("Überraschung", 5), "Über…");
        assert_eq!(ellipsize("Anything", 0), "Anything");
    }
}
