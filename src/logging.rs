use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::platform::{NativePlatform, Platform};

pub const LOG_LEVEL_ENV: &str = "CLAWFRIEND_LOG";
pub const LOG_FILE: &str = "clawfriend.log";

/// Writes each event to the log file (when it could be opened) and mirrors it
/// to stderr, keeping stdout free for `--json` output.
#[derive(Clone)]
pub(crate) struct FileMakeWriter {
    file: Option<Arc<Mutex<File>>>,
    mirror_stderr: bool,
}

impl FileMakeWriter {
    pub fn open(logs_dir: &Path, mirror_stderr: bool) -> Self {
        let file = std::fs::create_dir_all(logs_dir)
            .and_then(|_| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(logs_dir.join(LOG_FILE))
            })
            .ok();
        if file.is_some() {
            NativePlatform::restrict_dir_permissions(logs_dir);
        }
        Self {
            file: file.map(|f| Arc::new(Mutex::new(f))),
            mirror_stderr,
        }
    }
}

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriter {
            file: self.file.clone(),
            mirror_stderr: self.mirror_stderr,
        }
    }
}

pub(crate) struct FileWriter {
    file: Option<Arc<Mutex<File>>>,
    mirror_stderr: bool,
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.write_all(buf); // Best effort
        }
        if self.mirror_stderr {
            std::io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.flush();
        }
        if self.mirror_stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

pub(crate) fn parse_level(raw: Option<&str>) -> Level {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("error") => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(data_dir: &Path) {
    let level = parse_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let make_writer = FileMakeWriter::open(&data_dir.join("logs"), true);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults_to_warn() {
        assert_eq!(parse_level(None), Level::WARN);
        assert_eq!(parse_level(Some("bogus")), Level::WARN);
        assert_eq!(parse_level(Some(" DEBUG ")), Level::DEBUG);
        assert_eq!(parse_level(Some("info")), Level::INFO);
    }

    #[test]
    fn writer_appends_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let make_writer = FileMakeWriter::open(&logs, false);

        make_writer.make_writer().write_all(b"first\n").unwrap();
        make_writer.make_writer().write_all(b"second\n").unwrap();

        let content = std::fs::read_to_string(logs.join(LOG_FILE)).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
