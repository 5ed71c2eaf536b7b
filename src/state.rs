use crate::config::Config;
use crate::index::ApplicationIndex;
use crate::model::ApplicationEntry;

pub struct AppState {
    pub config: Config,
    pub index: ApplicationIndex,
    /// Positions into `index.all_entries()` matching `query`.
    pub filtered_indices: Vec<usize>,
    /// Position into `filtered_indices`.
    pub selected_index: usize,
    pub query: String,
}

impl AppState {
    pub fn new(config: Config, index: ApplicationIndex) -> Self {
        let mut state = Self {
            config,
            index,
            filtered_indices: Vec::new(),
            selected_index: 0,
            query: String::new(),
        };
        state.update_filter();
        state
    }

    pub fn push_str(&mut self, text: &str) {
        self.query.push_str(text);
        self.update_filter();
    }

    pub fn pop_char(&mut self) {
        if self.query.pop().is_some() {
            self.update_filter();
        }
    }

    pub fn update_filter(&mut self) {
        self.filtered_indices = self.index.filter_indices(&self.query);
        log::info!("AppState: query='{}', filtered_count={}", self.query, self.filtered_indices.len());
        self.selected_index = 0;
    }

    /// Moves along the grid in reading order, wrapping at both ends.
    pub fn move_selection(&mut self, delta: i32) {
        if self.filtered_indices.is_empty() {
            self.selected_index = 0;
            return;
        }

        let len = self.filtered_indices.len() as i32;
        let new_index = (self.selected_index as i32 + delta).rem_euclid(len);
        self.selected_index = new_index as usize;
    }

    /// Moves by whole rows, clamping to the first and last tile.
    pub fn move_rows(&mut self, rows: i32) {
        if self.filtered_indices.is_empty() {
            self.selected_index = 0;
            return;
        }

        let columns = self.config.theme.columns() as i32;
        let last = self.filtered_indices.len() as i32 - 1;
        let target = self.selected_index as i32 + rows * columns;
        self.selected_index = target.clamp(0, last) as usize;
    }

    /// Selects the tile at `position` in the filtered list, if there is one.
    pub fn select(&mut self, position: usize) -> bool {
        if position < self.filtered_indices.len() {
            self.selected_index = position;
            true
        } else {
            false
        }
    }

    pub fn visible_entry(&self, position: usize) -> Option<&ApplicationEntry> {
        self.filtered_indices
            .get(position)
            .and_then(|&idx| self.index.get(idx))
    }

    pub fn get_selected(&self) -> Option<&ApplicationEntry> {
        self.visible_entry(self.selected_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AppInfo, Registry};

    struct Apps(Vec<&'static str>);

    impl Registry for Apps {
        fn scan(&self) -> Vec<AppInfo> {
            self.0
                .iter()
                .map(|name| {
                    let mut info = AppInfo::new(format!("{}.desktop", name));
                    info.name = Some(name.to_string());
                    info
                })
                .collect()
        }
    }

    fn state(names: Vec<&'static str>) -> AppState {
        AppState::new(Config::default(), ApplicationIndex::new(Apps(names)))
    }

    fn twelve() -> AppState {
        state(vec![
            "A0", "A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "B0", "B1",
        ])
    }

    #[test]
    fn starts_with_everything_selected_first() {
        let state = twelve();
        assert_eq!(state.filtered_indices.len(), 12);
        assert_eq!(state.get_selected().unwrap().display_name, "A0");
    }

    #[test]
    fn typing_filters_and_resets_selection() {
        let mut state = twelve();
        state.move_selection(3);
        state.push_str("b");
        assert_eq!(state.filtered_indices.len(), 2);
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.get_selected().unwrap().display_name, "B0");

        state.pop_char();
        assert_eq!(state.filtered_indices.len(), 12);

        state.push_str("zzz");
        assert!(state.get_selected().is_none());
    }

    #[test]
    fn horizontal_moves_wrap() {
        let mut state = twelve();
        state.move_selection(-1);
        assert_eq!(state.selected_index, 11);
        state.move_selection(1);
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn vertical_moves_clamp() {
        let mut state = twelve();
        state.move_rows(1);
        assert_eq!(state.selected_index, 5);
        state.move_rows(1);
        assert_eq!(state.selected_index, 10);
        state.move_rows(1);
        assert_eq!(state.selected_index, 11);
        state.move_rows(-5);
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn empty_results_keep_selection_at_zero() {
        let mut state = state(vec![]);
        state.move_selection(1);
        state.move_rows(1);
        assert_eq!(state.selected_index, 0);
        assert!(!state.select(0));
    }

    #[test]
    fn select_by_position() {
        let mut state = twelve();
        assert!(state.select(7));
        assert_eq!(state.get_selected().unwrap().display_name, "A7");
        assert!(!state.select(12));
        assert_eq!(state.selected_index, 7);
    }
}
