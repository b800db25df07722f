#![warn(clippy::all, rust_2018_idioms)]

//! Logging macros with `[file:module:line]` context.
//!
//! - `log_*!` write to both `log` and `tracing`. Use them for operational
//!   events (query started, batch finished, remote failures) that an
//!   embedding application may collect through either facade.
//! - `trace_*!` write to `tracing` only. Use them for per-request detail.
//!
//! The binary bridges `log` into `tracing` but ignores this crate's own `log`
//! records, so `log_*!` events are not written twice.
//!
//! Example output:
//!   [src/app/log_actions/lifecycle.rs:logsdash::app::log_actions::lifecycle:87] Started query 1a2b for refId A
//!
//! Levels:
//! - TRACE/DEBUG: request parameters, remote call outcomes, row counts
//! - INFO: query submitted or stopped, batch executed, server lifecycle
//! - WARN: failed actions, throttling, out-of-range remote values
//! - ERROR: the server or client cannot continue

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_context {
    ($level:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        log::$level!("[{}:{}:{}] {}", file!(), module_path!(), line!(), message);
        tracing::$level!("[{}:{}:{}] {}", file!(), module_path!(), line!(), message);
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __trace_with_context {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_with_context!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_with_context!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_with_context!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_with_context!(error, $($arg)*) };
}

#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => { $crate::__trace_with_context!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! trace_info {
    ($($arg:tt)*) => { $crate::__trace_with_context!(info, $($arg)*) };
}

#[macro_export]
macro_rules! trace_warn {
    ($($arg:tt)*) => { $crate::__trace_with_context!(warn, $($arg)*) };
}
