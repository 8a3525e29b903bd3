use chrono::Local;
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Installs the process-wide logger. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_env(Env::default());

    // A second init (tests, embedding) is not fatal.
    if builder.try_init().is_ok() {
        log::debug!("Logger initialized at {}.", level);
    }
}
