use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static PROCESS_TAG: RwLock<String> = RwLock::new(String::new());

/// Turns debug output on or off for the whole process.
pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Sets the process name that prefixes every debug line.
pub fn set_process_tag(process_name: &str) {
    if let Ok(mut tag) = PROCESS_TAG.write() {
        tag.clear();
        tag.push_str(process_name);
    }
}

pub fn process_tag() -> String {
    PROCESS_TAG
        .read()
        .map(|tag| tag.clone())
        .unwrap_or_default()
}

pub fn enabled(level: LogLevel) -> bool {
    level < LogLevel::Debug || debug_enabled()
}

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::LogLevel::Debug) {
            $crate::tracing::debug!(
                target: "PixelPropsUtils",
                "[{}] {}",
                $crate::logging::process_tag(),
                format_args!($($arg)*)
            );
        }
    };
}

#[macro_export]
macro_rules! elog {
    ($($arg:tt)*) => {
        $crate::tracing::error!(
            target: "PixelPropsUtils",
            process = %$crate::logging::process_tag(),
            "{}",
            format_args!($($arg)*)
        );
    };
}
