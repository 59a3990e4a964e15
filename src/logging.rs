use std::io::Write;

use colored::Colorize;
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};

/// Map the `-v` count onto a level. Warnings stay visible by default so
/// problems like a missing ticket URL mapping reach the operator.
fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Route all diagnostics to stderr so stdout carries only menus and the
/// generated description.
pub fn init_logger(verbosity: u8) {
    let level = level_for(verbosity);

    let mut builder = Builder::new();
    builder.filter_level(level).target(Target::Stderr);

    builder.format(move |buf, record| {
        let label = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".white().bold(),
            Level::Debug => "DEBUG".bright_black(),
            Level::Trace => "TRACE".bright_black(),
        };

        if level >= LevelFilter::Debug {
            let target = record.target().trim_start_matches("mrbot::");
            writeln!(buf, "{} [{}] {}", label, target.bright_black(), record.args())
        } else {
            writeln!(buf, "{} {}", label, record.args())
        }
    });

    builder.init();
}
