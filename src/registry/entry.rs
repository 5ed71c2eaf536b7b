//! Reading the `[Desktop Entry]` group of a desktop file.

use std::collections::HashMap;
use std::env;

const DESKTOP_ENTRY_GROUP: &str = "[Desktop Entry]";

/// Keys of the `[Desktop Entry]` group, values kept in their escaped form.
#[derive(Debug, Default, Clone)]
pub struct DesktopFile {
    keys: HashMap<String, String>,
}

impl DesktopFile {
    /// Returns `None` when the content has no `[Desktop Entry]` group.
    pub fn parse(content: &str) -> Option<Self> {
        let mut keys = HashMap::new();
        let mut in_group = false;
        let mut found_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') {
                in_group = line == DESKTOP_ENTRY_GROUP;
                found_group |= in_group;
                continue;
            }

            if !in_group {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                // First occurrence wins
                keys.entry(key.trim().to_string())
                    .or_insert_with(|| value.trim_start().to_string());
            }
        }

        found_group.then_some(Self { keys })
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.keys.get(key).map(|raw| unescape(raw))
    }

    /// Looks up `key[locale]` variants from most to least specific before the plain key.
    pub fn locale_string(&self, key: &str, locale: Option<&Locale>) -> Option<String> {
        if let Some(locale) = locale {
            for suffix in locale.candidates() {
                if let Some(value) = self.string(&format!("{}[{}]", key, suffix)) {
                    return Some(value);
                }
            }
        }
        self.string(key)
    }

    pub fn boolean(&self, key: &str) -> bool {
        matches!(self.keys.get(key).map(|v| v.trim()), Some("true") | Some("1"))
    }

    /// Splits on unescaped `;`, dropping empty items.
    pub fn list(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.keys.get(key) else {
            return Vec::new();
        };

        let mut items = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(';') => current.push(';'),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => current.push('\\'),
                },
                ';' => items.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        items.push(current);

        items
            .into_iter()
            .map(|item| unescape(&item))
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Decodes the string escapes `\s`, `\n`, `\t`, `\r` and `\\`. Unknown escapes are kept as-is.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// A POSIX locale name split into the parts used for key matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    lang: String,
    country: Option<String>,
    modifier: Option<String>,
}

impl Locale {
    /// Parses `lang_COUNTRY.ENCODING@MODIFIER`. The encoding is discarded.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "C" || raw == "POSIX" || raw.starts_with("C.") {
            return None;
        }

        let (rest, modifier) = match raw.split_once('@') {
            Some((rest, modifier)) => (rest, Some(modifier.to_string())),
            None => (raw, None),
        };
        let rest = rest.split_once('.').map_or(rest, |(before, _)| before);
        let (lang, country) = match rest.split_once('_') {
            Some((lang, country)) => (lang, Some(country.to_string())),
            None => (rest, None),
        };

        if lang.is_empty() {
            return None;
        }

        Some(Self {
            lang: lang.to_string(),
            country,
            modifier,
        })
    }

    pub fn from_env() -> Option<Self> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .and_then(|value| Self::parse(&value))
    }

    fn candidates(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(4);
        if let Some(country) = &self.country {
            if let Some(modifier) = &self.modifier {
                out.push(format!("{}_{}@{}", self.lang, country, modifier));
            }
            out.push(format!("{}_{}", self.lang, country));
        }
        if let Some(modifier) = &self.modifier {
            out.push(format!("{}@{}", self.lang, modifier));
        }
        out.push(self.lang.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
# comment
[Desktop Entry]
Type=Application
Name=Firefox
Name[de]=Feuerfuchs
Name[pt_BR]=Raposa
Name=Ignored duplicate
Comment=Browse\\sthe\\tweb
Keywords=web;browser\\;internet;;
NoDisplay=false
Terminal=true

[Desktop Action new-window]
Name=New Window
Exec=firefox --new-window
";

    #[test]
    fn reads_only_desktop_entry_group() {
        let file = DesktopFile::parse(FIREFOX).unwrap();
        assert_eq!(file.string("Name").as_deref(), Some("Firefox"));
        assert_eq!(file.string("Exec"), None);
        assert!(file.boolean("Terminal"));
        assert!(!file.boolean("NoDisplay"));
        assert!(!file.boolean("Hidden"));
    }

    #[test]
    fn missing_group_is_rejected() {
        assert!(DesktopFile::parse("Name=Orphan\n[Other]\nName=x\n").is_none());
    }

    #[test]
    fn decodes_escapes_and_lists() {
        let file = DesktopFile::parse(FIREFOX).unwrap();
        assert_eq!(file.string("Comment").as_deref(), Some("Browse the\tweb"));
        assert_eq!(file.list("Keywords"), vec!["web", "browser;internet"]);
        assert!(file.list("Categories").is_empty());
        assert_eq!(unescape(r"a\\b\;c"), r"a\b\;c");
    }

    #[test]
    fn picks_most_specific_locale() {
        let file = DesktopFile::parse(FIREFOX).unwrap();

        let brazil = Locale::parse("pt_BR.UTF-8").unwrap();
        assert_eq!(file.locale_string("Name", Some(&brazil)).as_deref(), Some("Raposa"));

        let austria = Locale::parse("de_AT.UTF-8@euro").unwrap();
        assert_eq!(file.locale_string("Name", Some(&austria)).as_deref(), Some("Feuerfuchs"));

        let french = Locale::parse("fr_FR").unwrap();
        assert_eq!(file.locale_string("Name", Some(&french)).as_deref(), Some("Firefox"));
        assert_eq!(file.locale_string("Name", None).as_deref(), Some("Firefox"));
    }

    #[test]
    fn locale_parsing() {
        assert_eq!(Locale::parse("C"), None);
        assert_eq!(Locale::parse("C.UTF-8"), None);
        assert_eq!(Locale::parse(""), None);

        let locale = Locale::parse("sr_RS.UTF-8@latin").unwrap();
        assert_eq!(
            locale.candidates(),
            vec!["sr_RS@latin", "sr_RS", "sr@latin", "sr"]
        );
    }
}
