use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_dirs::AppDirs;

const DEFAULT_FILTER: &str = "brainboost=info";

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Routes tracing output to the state directory log file.
///
/// The terminal belongs to the game screen, so nothing is written to stdout
/// or stderr. `RUST_LOG` overrides the default filter. Returns the log path
/// when a subscriber was installed.
pub fn init() -> Option<PathBuf> {
    let path = AppDirs::log_path()?;
    init_at(&path).ok().map(|()| path)
}

pub fn init_at(path: &Path) -> std::io::Result<()> {
    let file = open_log(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(std::io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_log_file_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("brainboost.log");
        let file = open_log(&path).unwrap();
        drop(file);
        assert!(path.exists());
    }
}
