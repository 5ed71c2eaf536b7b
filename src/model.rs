use crate::registry::AppInfo;

/// Display name used when a descriptor carries no `Name`.
pub const FALLBACK_NAME: &str = "Unknown";
/// Icon used when a descriptor carries no `Icon`.
pub const FALLBACK_ICON: &str = "application-x-executable";

/// One launchable application as shown in the grid.
#[derive(Debug)]
pub struct ApplicationEntry {
    pub display_name: String,
    pub icon_identifier: String,
    /// Descriptor needed to launch; `None` when the entry cannot be launched.
    pub handle: Option<AppInfo>,
}

impl ApplicationEntry {
    pub fn from_app_info(info: AppInfo) -> Self {
        let display_name = info
            .name
            .clone()
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        let icon_identifier = info
            .icon
            .clone()
            .unwrap_or_else(|| FALLBACK_ICON.to_string());

        Self {
            display_name,
            icon_identifier,
            handle: Some(info),
        }
    }

    #[cfg(test)]
    pub fn detached(display_name: impl Into<String>, icon_identifier: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            icon_identifier: icon_identifier.into(),
            handle: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.handle.as_ref().map(|info| info.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_and_icon_fall_back() {
        let entry = ApplicationEntry::from_app_info(AppInfo::new("nameless.desktop"));
        assert_eq!(entry.display_name, FALLBACK_NAME);
        assert_eq!(entry.icon_identifier, FALLBACK_ICON);
        assert_eq!(entry.id(), Some("nameless.desktop"));
    }

    #[test]
    fn provided_name_and_icon_are_kept() {
        let mut info = AppInfo::new("org.gimp.GIMP.desktop");
        info.name = Some("GIMP".to_string());
        info.icon = Some("gimp".to_string());

        let entry = ApplicationEntry::from_app_info(info);
        assert_eq!(entry.display_name, "GIMP");
        assert_eq!(entry.icon_identifier, "gimp");
    }

    #[test]
    fn detached_entry_has_no_handle() {
        let entry = ApplicationEntry::detached("Ghost", FALLBACK_ICON);
        assert!(entry.handle.is_none());
        assert_eq!(entry.id(), None);
    }
}
