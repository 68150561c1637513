use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use vitals_core::{Alert, AlertSink};

use crate::format::csv_line;
use crate::DispatchError;

/// Appends one `patient_id,condition,timestamp` line per alert.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) `path` for appending, creating parent directories.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DispatchError> {
        let path = path.into();
        let io_err = |source| DispatchError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertSink for FileSink {
    fn deliver(&self, alert: Alert) {
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(file, "{}", csv_line(&alert)) {
            tracing::warn!("Failed to write alert to {}: {}", self.path.display(), e);
        }
    }
}
