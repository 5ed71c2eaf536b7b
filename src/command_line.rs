//! Expansion of the desktop entry `Exec` key into an argument vector.

use crate::error::LaunchError;
use crate::model::FALLBACK_NAME;
use crate::registry::AppInfo;

/// Field codes that are removed without replacement.
const DROPPED_CODES: [&str; 10] = ["%f", "%F", "%u", "%U", "%d", "%D", "%n", "%N", "%v", "%m"];

/// Splits `exec` into arguments and expands field codes. No files or URIs are
/// passed, so `%f`, `%F`, `%u` and `%U` expand to nothing.
pub fn expand(exec: &str, info: &AppInfo) -> Result<Vec<String>, LaunchError> {
    let mut argv = Vec::new();

    for arg in split_arguments(exec)? {
        if DROPPED_CODES.contains(&arg.as_str()) {
            continue;
        }
        if arg == "%i" {
            if let Some(icon) = &info.icon {
                argv.push("--icon".to_string());
                argv.push(icon.clone());
            }
            continue;
        }
        argv.push(expand_field_codes(&arg, info)?);
    }

    Ok(argv)
}

fn expand_field_codes(arg: &str, info: &AppInfo) -> Result<String, LaunchError> {
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('c') => out.push_str(info.name.as_deref().unwrap_or(FALLBACK_NAME)),
            Some('k') => out.push_str(&info.source.to_string_lossy()),
            Some('f' | 'F' | 'u' | 'U' | 'i' | 'd' | 'D' | 'n' | 'N' | 'v' | 'm') => {}
            Some(other) => return Err(LaunchError::InvalidFieldCode(format!("%{}", other))),
            None => return Err(LaunchError::InvalidFieldCode("%".to_string())),
        }
    }

    Ok(out)
}

/// Splits on unquoted whitespace. Inside double quotes, `\"`, `` \` ``, `\$` and
/// `\\` are unescaped.
pub(crate) fn split_arguments(exec: &str) -> Result<Vec<String>, LaunchError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        None => return Err(LaunchError::UnterminatedQuote),
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '`' | '$' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(LaunchError::UnterminatedQuote),
                        },
                        Some(other) => current.push(other),
                    }
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn info() -> AppInfo {
        let mut info = AppInfo::new("org.gimp.GIMP.desktop");
        info.name = Some("GNU Image Manipulation Program".to_string());
        info.icon = Some("gimp".to_string());
        info.source = PathBuf::from("/usr/share/applications/org.gimp.GIMP.desktop");
        info
    }

    #[test]
    fn drops_file_and_url_codes() {
        assert_eq!(expand("gimp-2.10 %U", &info()).unwrap(), vec!["gimp-2.10"]);
        assert_eq!(expand("vlc --started-from-file %F", &info()).unwrap(), vec!["vlc", "--started-from-file"]);
        assert_eq!(expand("app --file=%f", &info()).unwrap(), vec!["app", "--file="]);
    }

    #[test]
    fn expands_icon_name_and_location() {
        assert_eq!(
            expand("gimp %i --title %c --from %k", &info()).unwrap(),
            vec![
                "gimp",
                "--icon",
                "gimp",
                "--title",
                "GNU Image Manipulation Program",
                "--from",
                "/usr/share/applications/org.gimp.GIMP.desktop",
            ]
        );

        let mut no_icon = info();
        no_icon.icon = None;
        assert_eq!(expand("gimp %i", &no_icon).unwrap(), vec!["gimp"]);
    }

    #[test]
    fn nameless_descriptor_uses_fallback_title() {
        assert_eq!(
            expand("app --title %c", &AppInfo::new("nameless.desktop")).unwrap(),
            vec!["app", "--title", FALLBACK_NAME]
        );
    }

    #[test]
    fn percent_escape() {
        assert_eq!(expand("printf 100%%", &info()).unwrap(), vec!["printf", "100%"]);
    }

    #[test]
    fn handles_quoting() {
        assert_eq!(
            expand(r#"sh -c "echo \"hi\" \$HOME \\ done"  "" last"#, &info()).unwrap(),
            vec!["sh", "-c", r#"echo "hi" $HOME \ done"#, "", "last"]
        );
        assert_eq!(
            expand(r#""/opt/My App/bin/app" --flag"#, &info()).unwrap(),
            vec!["/opt/My App/bin/app", "--flag"]
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(expand(r#"app "open"#, &info()), Err(LaunchError::UnterminatedQuote)));
        assert!(matches!(
            expand("app %z", &info()),
            Err(LaunchError::InvalidFieldCode(code)) if code == "%z"
        ));
        assert!(matches!(expand("app 50%", &info()), Err(LaunchError::InvalidFieldCode(_))));
    }

    #[test]
    fn blank_line_yields_no_arguments() {
        assert!(expand("   ", &info()).unwrap().is_empty());
    }
}
