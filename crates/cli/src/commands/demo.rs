//! Demo store management commands.
//!
//! These operate on the store under the configured data directory whether
//! or not demo mode is enabled, so a store can be prepared before switching
//! the console over to it.
//!
//! # Usage
//!
//! ```bash
//! sd-cli demo init
//! sd-cli demo reset
//! sd-cli demo export -o backup.json
//! sd-cli demo import backup.json
//! ```

#![allow(clippy::print_stdout)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use support_desk::ConsoleConfig;
use support_desk::demo::{DemoDataManager, DemoError};
use support_desk::store::{FileStore, StoreError};

/// Errors that can occur during demo store commands.
#[derive(Debug, Error)]
pub enum DemoCommandError {
    /// The store directory could not be opened.
    #[error("Cannot open demo store: {0}")]
    Open(#[from] StoreError),

    /// A demo data operation failed.
    #[error(transparent)]
    Demo(#[from] DemoError),

    /// Reading or writing a file failed.
    #[error("File error for {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Open the demo store under `config.demo.data_dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn open(config: ConsoleConfig) -> Result<DemoDataManager, DemoCommandError> {
    let store = FileStore::open(config.demo.data_dir.clone())?;
    info!(data_dir = %store.dir().display(), "Opened demo store");
    Ok(DemoDataManager::new(Arc::new(store), config.demo))
}

/// Seed the store if it is empty.
///
/// # Errors
///
/// Returns an error if the seed data cannot be written.
pub fn init(demo: &DemoDataManager) -> Result<(), DemoCommandError> {
    if demo.initialize()? {
        println!("Demo store seeded");
    } else {
        println!("Demo store already holds data; nothing to do");
    }
    Ok(())
}

/// Replace all demo data with seed data.
///
/// # Errors
///
/// Returns an error if the seed data cannot be written.
pub fn reset(demo: &DemoDataManager) -> Result<(), DemoCommandError> {
    demo.reset()?;
    println!("Demo store reset");
    Ok(())
}

/// Write the store as JSON to `out`, or stdout.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn export(demo: &DemoDataManager, out: Option<&Path>) -> Result<(), DemoCommandError> {
    let json = demo.export()?;
    match out {
        Some(path) => {
            std::fs::write(path, json).map_err(|source| file_error(path, source))?;
            info!(path = %path.display(), "Exported demo data");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").map_err(|source| file_error(Path::new("<stdout>"), source))?;
        }
    }
    Ok(())
}

/// Replace the store with the contents of `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation. The
/// store is unchanged in that case.
pub fn import(demo: &DemoDataManager, file: &Path) -> Result<(), DemoCommandError> {
    let json = std::fs::read_to_string(file).map_err(|source| file_error(file, source))?;
    demo.import(&json)?;
    println!("Imported demo data from {}", file.display());
    Ok(())
}

fn file_error(path: &Path, source: std::io::Error) -> DemoCommandError {
    DemoCommandError::File {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &Path) -> DemoDataManager {
        let mut config = ConsoleConfig::from_lookup(|_| None).expect("config");
        config.demo.data_dir = dir.to_path_buf();
        open(config).expect("open")
    }

    #[test]
    fn test_export_import_through_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let demo = manager(&dir.path().join("store"));
        init(&demo).expect("init");

        let backup = dir.path().join("backup.json");
        export(&demo, Some(&backup)).expect("export");

        let other = manager(&dir.path().join("other"));
        import(&other, &backup).expect("import");
        assert_eq!(other.snapshot(), demo.snapshot());
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let demo = manager(dir.path());
        let result = import(&demo, &dir.path().join("nope.json"));
        assert!(matches!(result, Err(DemoCommandError::File { .. })));
    }
}
