use crate::model::ApplicationEntry;
use crate::registry::Registry;
use log::info;

/// Visible applications sorted by display name.
pub struct ApplicationIndex {
    registry: Box<dyn Registry>,
    entries: Vec<ApplicationEntry>,
}

impl ApplicationIndex {
    pub fn new(registry: impl Registry + 'static) -> Self {
        let mut index = Self {
            registry: Box::new(registry),
            entries: Vec::new(),
        };
        index.refresh();
        index
    }

    /// Rebuilds the index from the registry. The previous entries, and the
    /// handles they own, are dropped once the new list is in place.
    pub fn refresh(&mut self) {
        let mut entries: Vec<ApplicationEntry> = self
            .registry
            .scan()
            .into_iter()
            .filter(|info| info.should_show())
            .map(ApplicationEntry::from_app_info)
            .collect();

        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        self.entries = entries;
        info!("ApplicationIndex: {} visible applications", self.len());
    }

    pub fn all_entries(&self) -> &[ApplicationEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&ApplicationEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose display name contains `query`, ignoring ASCII case.
    pub fn filter(&self, query: &str) -> Vec<&ApplicationEntry> {
        self.filter_indices(query)
            .into_iter()
            .map(|idx| &self.entries[idx])
            .collect()
    }

    /// Same as [`filter`](Self::filter) but yields positions into [`all_entries`](Self::all_entries).
    pub fn filter_indices(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return (0..self.entries.len()).collect();
        }

        let needle = query.to_ascii_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.display_name.to_ascii_lowercase().contains(&needle))
            .map(|(idx, _)| idx)
            .collect()
    }
}
