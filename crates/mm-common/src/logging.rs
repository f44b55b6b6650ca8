//! Process-wide tracing setup for the server binary.
//!
//! `RUST_LOG` filters events (default `info`). `MM_LOG_DIR` moves output from
//! stdout to `<dir>/<app>.log`, rotated daily. `MM_LOG_INCLUDE_BACKTRACE` also
//! runs the default panic hook after the panic is logged.

use std::any::Any;
use std::ffi::OsString;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::ids;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub include_backtrace: bool,
}

impl LogSettings {
    pub fn from_values(dir: Option<OsString>, include_backtrace: Option<String>) -> Self {
        Self {
            dir: dir.filter(|value| !value.is_empty()).map(PathBuf::from),
            include_backtrace: include_backtrace.as_deref().is_some_and(is_truthy),
        }
    }

    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var_os("MM_LOG_DIR"),
            std::env::var("MM_LOG_INCLUDE_BACKTRACE").ok(),
        )
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn open_log_file(dir: &Path, app_name: &str) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    Ok(tracing_appender::non_blocking(appender))
}

// Later calls keep the first hook.
fn install_panic_hook(app_name: &'static str, include_backtrace: bool) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));

            tracing::error!(
                application = app_name,
                run_id = ids::run_id(),
                thread = thread.name().unwrap_or("unnamed"),
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %panic_message(info.payload()),
                "panic"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

/// Installs the global subscriber and panic hook, then logs one startup line.
/// A subscriber that is already set is kept.
pub fn init(app_name: &'static str, settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let file = settings.dir.as_deref().and_then(|dir| match open_log_file(dir, app_name) {
        Ok(opened) => Some(opened),
        Err(err) => {
            eprintln!("cannot write logs to {}: {err}; using stdout", dir.display());
            None
        }
    });

    let to_file = match file {
        Some((writer, guard)) => {
            let _ = FILE_GUARD.set(guard);
            let _ = builder.with_ansi(false).with_writer(writer).try_init();
            true
        }
        None => {
            let _ = builder.try_init();
            false
        }
    };

    install_panic_hook(app_name, settings.include_backtrace);
    info!(
        application = app_name,
        run_id = ids::run_id(),
        to_file,
        "logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_ignore_empty_dir_and_parse_flags() {
        let settings = LogSettings::from_values(Some(OsString::from("/var/log/mm")), Some("Yes".into()));
        assert_eq!(settings.dir, Some(PathBuf::from("/var/log/mm")));
        assert!(settings.include_backtrace);

        let settings = LogSettings::from_values(Some(OsString::new()), Some("0".into()));
        assert_eq!(settings, LogSettings::default());
    }

    #[test]
    fn panic_payloads_become_messages() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(&*literal), "boom");
        assert_eq!(panic_message(&*owned), "bang");
        assert_eq!(panic_message(&*other), "non-string panic payload");
    }

    #[test]
    fn log_file_directory_is_created() {
        let dir = std::env::temp_dir().join(ids::generate("mm-logs"));
        let opened = open_log_file(&dir, "mm-test");
        assert!(opened.is_ok());
        assert!(dir.is_dir());
        drop(opened);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
