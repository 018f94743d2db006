//! JSON persistence for datasets.
//!
//! Layout: `{"version": 1, "entries": [{"label": "...", "descriptor": [...]}]}`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::domain::dataset::Dataset;
use crate::dataset::domain::labeled_descriptor::LabeledDescriptor;
use crate::shared::constants::DATASET_FORMAT_VERSION;

#[derive(Error, Debug)]
pub enum DatasetFileError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write dataset {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported dataset version {found} in {path}")]
    Version { path: PathBuf, found: u32 },
}

#[derive(Serialize)]
struct DatasetFileRef<'a> {
    version: u32,
    entries: &'a [LabeledDescriptor],
}

#[derive(Deserialize)]
struct DatasetFile {
    version: u32,
    entries: Vec<LabeledDescriptor>,
}

pub fn load(path: &Path) -> Result<Dataset, DatasetFileError> {
    let json = fs::read_to_string(path).map_err(|e| DatasetFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file: DatasetFile = serde_json::from_str(&json).map_err(|e| DatasetFileError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    if file.version != DATASET_FORMAT_VERSION {
        return Err(DatasetFileError::Version {
            path: path.to_path_buf(),
            found: file.version,
        });
    }
    log::debug!("Loaded {} samples from {}", file.entries.len(), path.display());
    Ok(Dataset::from_entries(file.entries))
}

/// Like [`load`], but a missing file yields an empty dataset.
pub fn load_or_default(path: &Path) -> Result<Dataset, DatasetFileError> {
    if path.exists() {
        load(path)
    } else {
        Ok(Dataset::new())
    }
}

/// Writes through a `.part` file and renames, so readers never see a
/// half-written dataset.
pub fn save(path: &Path, dataset: &Dataset) -> Result<(), DatasetFileError> {
    let write_err = |source| DatasetFileError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file = DatasetFileRef {
        version: DATASET_FORMAT_VERSION,
        entries: dataset.snapshot(),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let temp_path = path.with_extension("part");
    if let Err(e) = fs::write(&temp_path, json).and_then(|_| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(write_err(e));
    }
    log::debug!("Saved {} samples to {}", dataset.len(), path.display());
    Ok(())
}
