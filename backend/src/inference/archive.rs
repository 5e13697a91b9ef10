//! Unpacking of compressed model artifacts.
//!
//! Models may ship as a `.tar.gz` holding the actual model file. The archive is
//! unpacked once into a working directory; later loads find the model file
//! already there and skip extraction.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;

use super::LoadError;

pub fn is_archive(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Returns the path of `model_file` inside `extract_dir`, unpacking `archive`
/// first unless that file already exists.
pub fn extract_model(archive: &Path, extract_dir: &Path, model_file: &str) -> Result<PathBuf, LoadError> {
    let target = extract_dir.join(model_file);
    if target.exists() {
        log::info!("Model already extracted at {}", target.display());
        return Ok(target);
    }
    if !archive.exists() {
        return Err(LoadError::NotFound(archive.to_path_buf()));
    }

    log::info!("Extracting {} into {}", archive.display(), extract_dir.display());
    let extract_err = |source| LoadError::Extract {
        path: archive.to_path_buf(),
        source,
    };
    fs::create_dir_all(extract_dir).map_err(extract_err)?;
    let file = File::open(archive).map_err(extract_err)?;
    // `unpack` refuses entries that would escape `extract_dir`.
    Archive::new(GzDecoder::new(file))
        .unpack(extract_dir)
        .map_err(extract_err)?;

    if !target.exists() {
        return Err(LoadError::MissingInArchive {
            archive: archive.to_path_buf(),
            file: model_file.to_string(),
        });
    }
    Ok(target)
}
