use crate::command_line;
use crate::config::Config;
use crate::error::LaunchError;
use crate::model::ApplicationEntry;
use crate::registry::AppInfo;
use log::{error, info, warn};
use nix::unistd::setsid;
use std::env;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Asks the OS to start `entry`. Failures are logged and otherwise ignored.
pub fn launch(entry: &ApplicationEntry, config: &Config) {
    if let Err(err) = try_launch(entry, config) {
        error!("Failed to launch {}: {}", entry.display_name, err);
    }
}

pub fn try_launch(entry: &ApplicationEntry, config: &Config) -> Result<(), LaunchError> {
    let app = entry.handle.as_ref().ok_or(LaunchError::NoHandle)?;
    let exec = app.exec.as_deref().ok_or(LaunchError::EmptyCommand)?;

    let mut argv = command_line::expand(exec, app)?;
    if argv.is_empty() {
        return Err(LaunchError::EmptyCommand);
    }

    if app.terminal {
        match terminal_command(config.general.terminal.as_deref()) {
            Some(mut term) => {
                term.append(&mut argv);
                argv = term;
            }
            None => warn!("{} wants a terminal but none is configured, running it directly", app.id),
        }
    }

    let child = build_command(&argv, app)
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            program: argv[0].clone(),
            source,
        })?;

    info!("Launched {} as pid {}", app.id, child.id());
    Ok(())
}

/// The configured terminal, else `$TERMINAL`, split into its arguments.
fn terminal_command(configured: Option<&str>) -> Option<Vec<String>> {
    configured
        .map(str::to_string)
        .or_else(|| env::var("TERMINAL").ok())
        .filter(|term| !term.trim().is_empty())
        .map(|term| term.split_whitespace().map(str::to_string).collect())
}

fn build_command(argv: &[String], app: &AppInfo) -> Command {
    let mut command = Command::new(&argv[0]);
    command
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if let Some(dir) = &app.working_dir {
        command.current_dir(dir);
    }

    // Own session, so the child outlives the launcher and its terminal.
    unsafe {
        command.pre_exec(|| setsid().map(drop).map_err(io::Error::from));
    }

    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneralConfig;
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::sync::{Mutex, Once};

    static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    /// Keeps every record so tests can check what `launch` reported.
    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut records) = RECORDS.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&CaptureLogger).unwrap();
            log::set_max_level(LevelFilter::Trace);
        });
    }

    /// Tests share the logger, so records are picked out by a name unique to each test.
    fn errors_mentioning(name: &str) -> Vec<String> {
        RECORDS
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, message)| *level == Level::Error && message.contains(name))
            .map(|(_, message)| message.clone())
            .collect()
    }

    fn entry_with_exec(exec: &str) -> ApplicationEntry {
        named_entry("Test", exec)
    }

    fn named_entry(name: &str, exec: &str) -> ApplicationEntry {
        let mut info = AppInfo::new("test.desktop");
        info.name = Some(name.to_string());
        info.exec = Some(exec.to_string());
        ApplicationEntry::from_app_info(info)
    }

    #[test]
    fn entry_without_handle_is_not_launched() {
        let entry = ApplicationEntry::detached("Ghost", "ghost");
        let config = Config::default();

        assert!(matches!(try_launch(&entry, &config), Err(LaunchError::NoHandle)));

        capture_logs();
        launch(&entry, &config);
        let errors = errors_mentioning("Ghost");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to launch Ghost"));
    }

    #[test]
    fn missing_or_blank_exec_is_rejected() {
        let config = Config::default();

        let bare = ApplicationEntry::from_app_info(AppInfo::new("bare.desktop"));
        assert!(matches!(try_launch(&bare, &config), Err(LaunchError::EmptyCommand)));

        let blank = entry_with_exec("%U");
        assert!(matches!(try_launch(&blank, &config), Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn spawn_failure_is_reported_and_swallowed() {
        let entry = named_entry("Phantom", "/nonexistent/definitely-not-a-program --flag");
        let config = Config::default();

        match try_launch(&entry, &config) {
            Err(LaunchError::Spawn { program, .. }) => {
                assert_eq!(program, "/nonexistent/definitely-not-a-program")
            }
            other => panic!("expected spawn error, got {:?}", other),
        }

        capture_logs();
        launch(&entry, &config);
        let errors = errors_mentioning("Phantom");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("/nonexistent/definitely-not-a-program"));
    }

    #[test]
    fn launches_a_real_program() {
        let entry = entry_with_exec("true %F");
        assert!(try_launch(&entry, &Config::default()).is_ok());
    }

    #[test]
    fn configured_terminal_wraps_command() {
        assert_eq!(
            terminal_command(Some("foot -e")),
            Some(vec!["foot".to_string(), "-e".to_string()])
        );
        assert_eq!(terminal_command(Some("   ")), None);
    }

    #[test]
    fn terminal_entries_run_through_configured_terminal() {
        let mut info = AppInfo::new("htop.desktop");
        info.exec = Some("htop".to_string());
        info.terminal = true;
        let entry = ApplicationEntry::from_app_info(info);

        let config = Config {
            general: GeneralConfig {
                terminal: Some("/nonexistent/terminal -e".to_string()),
                ..GeneralConfig::default()
            },
            ..Config::default()
        };

        match try_launch(&entry, &config) {
            Err(LaunchError::Spawn { program, .. }) => assert_eq!(program, "/nonexistent/terminal"),
            other => panic!("expected spawn error, got {:?}", other),
        }
    }
}
