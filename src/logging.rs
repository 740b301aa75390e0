//! Log setup for the `dockertimes` binary.
//!
//! Every reconciliation outcome is one log record (see
//! [`Outcome::level`](crate::reconcile::Outcome::level)). The default level
//! shows what changed on disk or in the cache; `-v` adds the unmodified
//! paths; `-q` keeps only reconciliation failures. `RUST_LOG`, when set,
//! replaces the flag-derived filter entirely.

use std::io::Write;

use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;

/// Install the global logger. Later calls are no-ops.
pub fn init_logging(verbose: u8, quiet: bool, no_color: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = std::env::var_os("RUST_LOG").is_some();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    if no_color {
        builder.write_style(WriteStyle::Never);
    }

    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if cfg!(debug_assertions) || verbose >= 2 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    if builder.try_init().is_ok() && from_env {
        log::debug!("Log filter taken from RUST_LOG");
    }
}

/// Filter chosen by `-v`/`-q`. Quiet wins over verbose.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}
