use std::io;

use tokio::runtime::Builder;
pub use tokio::runtime::Runtime;

use crate::config::RuntimeConfig;

mod environment;
pub use environment::{current as environment, Environment};

pub mod panic_hook;
pub mod signal;

/// Builds a multi-threaded [Tokio runtime](Runtime) according to the given `config`.
pub fn build(config: &RuntimeConfig) -> io::Result<Runtime> {
    let mut builder = Builder::new_multi_thread();
    builder.enable_all();

    if let Some(n) = config.worker_threads {
        builder.worker_threads(n.get());
    }

    if let Some(n) = config.max_blocking_threads {
        builder.max_blocking_threads(n.get());
    }

    builder.build()
}
