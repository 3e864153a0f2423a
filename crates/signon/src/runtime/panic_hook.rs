use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, PanicHookInfo};

use super::environment;

/// Sets the global [panic hook](std::panic::set_hook).
///
/// Panics are logged through `tracing` before the previous hook runs. Outside of local
/// development the backtrace is only included if `RUST_BACKTRACE` asked for one.
pub fn install() {
    let old_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        log_panic(panic_info);
        old_hook(panic_info)
    }));
}

fn log_panic(panic_info: &PanicHookInfo<'_>) {
    let backtrace = if environment().is_local() {
        Some(Backtrace::force_capture())
    } else {
        Some(Backtrace::capture()).filter(|bt| bt.status() == BacktraceStatus::Captured)
    };

    let message = panic_info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str));

    match (panic_info.location(), message, backtrace) {
        (Some(location), Some(message), Some(backtrace)) => {
            error!(target: "signon::panics", %location, %backtrace, "thread panicked: {message}");
        },
        (Some(location), Some(message), None) => {
            error!(target: "signon::panics", %location, "thread panicked: {message}");
        },
        (Some(location), None, Some(backtrace)) => {
            error!(target: "signon::panics", %location, %backtrace, "thread panicked");
        },
        (Some(location), None, None) => {
            error!(target: "signon::panics", %location, "thread panicked");
        },
        (None, Some(message), Some(backtrace)) => {
            error!(target: "signon::panics", %backtrace, "thread panicked: {message}");
        },
        (None, Some(message), None) => {
            error!(target: "signon::panics", "thread panicked: {message}");
        },
        (None, None, Some(backtrace)) => {
            error!(target: "signon::panics", %backtrace, "thread panicked");
        },
        (None, None, None) => {
            error!(target: "signon::panics", "thread panicked");
        },
    }
}
