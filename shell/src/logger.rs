use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{self, IsTerminal, Write};
use yansi::{Color, Paint};

pub fn init() {
    struct Logger {
        pretty: bool,
    }

    impl Log for Logger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            let (name, color) = match record.metadata().level() {
                Level::Error => ("error", Color::Red),
                Level::Warn => ("warn", Color::Magenta),
                Level::Info => ("info", Color::Yellow),
                Level::Debug => ("debug", Color::Cyan),
                Level::Trace => ("trace", Color::Blue),
            };

            let stderr = io::stderr();
            let mut out = stderr.lock();

            // The editor keeps the terminal in raw mode, so lines need an
            // explicit carriage return.
            let result = if self.pretty {
                write!(out, "{}: {}\r\n", Paint::new(name).fg(color).bold(), record.args())
            } else {
                write!(out, "{}: {}\r\n", name, record.args())
            };

            // Nowhere left to report a failing stderr.
            drop(result);
        }

        fn flush(&self) {
            let _ = io::stderr().flush();
        }
    }

    let pretty = io::stderr().is_terminal();

    if log::set_boxed_logger(Box::new(Logger { pretty })).is_err() {
        return;
    }

    log::set_max_level(LevelFilter::Warn);

    if pretty {
        log::debug!("tty detected, pretty logging is enabled");
    } else {
        log::debug!("stderr is not a tty, pretty logging is disabled");
    }
}

pub fn verbose(verbosity: u8) {
    log::set_max_level(match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
}

pub fn quiet() {
    log::set_max_level(LevelFilter::Off);
}
