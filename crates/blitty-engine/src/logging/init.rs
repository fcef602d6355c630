use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Once;

/// Filter applied when neither the config nor `RUST_LOG` provides one.
///
/// The GPU stack is chatty at info level, so it is held to warnings.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "blitty_engine=debug,wgpu=warn").
///
/// When `log_file` is set, every record is written to stderr and to that file.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            log_file: None,
        }
    }
}

/// Duplicates output to stderr and a log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// This function is idempotent; subsequent calls are ignored.
/// Intended usage is early in `main`. A log file that cannot be created is
/// reported once and logging continues on stderr only.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.parse_filters(DEFAULT_FILTER);
        }

        builder.write_style(config.write_style);

        let mut file_error = None;
        if let Some(path) = &config.log_file {
            match File::create(path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
                    // Escape codes would end up in the file.
                    builder.write_style(env_logger::WriteStyle::Never);
                }
                Err(err) => file_error = Some((path.clone(), err)),
            }
        }

        builder.init();

        if let Some((path, err)) = file_error {
            log::warn!("could not create log file {}: {err}", path.display());
        }
        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tee.log");
        let mut tee = Tee { file: File::create(&path).expect("create") };
        tee.write_all(b"hello\n").expect("write");
        tee.flush().expect("flush");
        drop(tee);

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "hello\n");
    }

    #[test]
    fn default_config_logs_to_stderr_only() {
        let config = LoggingConfig::default();
        assert!(config.log_file.is_none());
        assert!(config.env_filter.is_none());
    }
}
