// src/utils/logging.rs
//! Logging setup for the coordinator
//!
//! Wraps `env_logger` with a compact line format. `RUST_LOG` always wins
//! over the default level chosen here.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes logging at `info`, or `debug` when `verbose` is set
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbose: bool) {
    let mut builder = base_builder();

    match env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(default_level(verbose));
            // actix and hyper are chatty at debug
            builder.filter_module("actix_server", LevelFilter::Info);
            builder.filter_module("hyper_util", LevelFilter::Info);
        }
    }

    let _ = builder.try_init();
}

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn base_builder() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.module_path().unwrap_or_default(),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(default_level(true), LevelFilter::Debug);
        assert_eq!(default_level(false), LevelFilter::Info);
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init_logging(false);
        init_logging(true);
    }
}
