use std::io::{self, Write};

use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger {
  level: LevelFilter,
}

impl Log for StderrLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= self.level
  }

  fn log(&self, record: &Record) {
    if !self.enabled(record.metadata()) {
      return;
    }
    let line = format_line(record);
    let _ = io::stderr().lock().write_all(line.as_bytes());
  }

  fn flush(&self) {
    let _ = io::stderr().flush();
  }
}

fn format_line(record: &Record) -> String {
  format!(
    "{} {:<5} {} - {}\n",
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
    record.level(),
    record.target(),
    record.args()
  )
}

/// Parses a level name as accepted by `WISHLIST_LOG`.
pub fn parse_level(raw: &str) -> Option<LevelFilter> {
  raw.trim().parse::<LevelFilter>().ok()
}

/// Installs the stderr logger. Only the first call in a process takes effect.
pub fn init(level: LevelFilter) {
  let logger = Box::new(StderrLogger { level });
  if log::set_boxed_logger(logger).is_ok() {
    log::set_max_level(level);
  }
}
