//! Logger setup for the `adhoc` binary.

use log::LevelFilter;
use std::io::Write;

/// Parse a level name such as `warn` or `DEBUG`. Unknown names fall back to `Warn`.
pub fn level_from_name(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::Warn)
}

/// Initialise env_logger. `RUST_LOG` is read first and `level` applied on top;
/// `json` switches to one JSON object per line.
pub fn configure_logging(level: LevelFilter, json: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    if json {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{{\"ts\":\"{}\",\"lvl\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                buf.timestamp(),
                record.level(),
                record.target(),
                serde_json::Value::String(record.args().to_string())
            )
        });
    }
    // A second initialisation in the same process is ignored.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_name() {
        assert_eq!(level_from_name("debug"), LevelFilter::Debug);
        assert_eq!(level_from_name("INFO"), LevelFilter::Info);
        assert_eq!(level_from_name("loud"), LevelFilter::Warn);
    }
}
