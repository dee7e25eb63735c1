use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Writes every line to both sinks.
struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// Creates `<log_dir>/scraper_<timestamp>.log`.
fn create_log_file(log_dir: &Path) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!(
        "scraper_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Logs at `Info`, unless `RUST_LOG` says otherwise, to stderr and to a
/// fresh file under `log_dir`. Falls back to stderr alone when the file
/// cannot be created. Returns the file's path.
pub fn init(log_dir: &Path) -> Option<PathBuf> {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env();

    match create_log_file(log_dir) {
        Ok((path, file)) => {
            builder.target(Target::Pipe(Box::new(Tee {
                first: io::stderr(),
                second: file,
            })));
            builder.init();
            log::info!("Logging to {}", path.display());
            Some(path)
        }
        Err(e) => {
            builder.init();
            log::warn!(
                "Cannot write logs under {}, logging to stderr only: {}",
                log_dir.display(),
                e
            );
            None
        }
    }
}
