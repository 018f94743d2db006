use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(model_name, bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(&str, u64, u64) + Send>;

/// Locations of the two models the ONNX face engine needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineModelPaths {
    pub detector: PathBuf,
    pub embedder: PathBuf,
}

/// Resolve a model file by name, checking local locations before downloading.
///
/// Resolution order:
/// 1. `models_dir`, when the caller supplied one
/// 2. User cache directory (platform-specific)
/// 3. Download from URL to cache
pub fn resolve(
    name: &str,
    url: &str,
    models_dir: Option<&Path>,
    progress: Option<&ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url, models_dir, progress)
}

/// Resolves detector and embedder models for [`DetectEmbedEngine::onnx`].
///
/// [`DetectEmbedEngine::onnx`]: crate::detection::infrastructure::detect_embed_engine::DetectEmbedEngine::onnx
pub fn resolve_engine_models(
    models_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<EngineModelPaths, ModelResolveError> {
    let progress = progress.as_ref();
    Ok(EngineModelPaths {
        detector: resolve(YOLO_MODEL_NAME, YOLO_MODEL_URL, models_dir, progress)?,
        embedder: resolve(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, models_dir, progress)?,
    })
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    models_dir: Option<&Path>,
    progress: Option<&ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(dir) = models_dir {
        let local_path = dir.join(name);
        if local_path.exists() {
            return Ok(local_path);
        }
    }

    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    log::info!("Downloading model {name}");
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, name, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceMatch/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceMatch/models/` or `~/.cache/FaceMatch/models/`
/// - Windows: `%LOCALAPPDATA%/FaceMatch/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceMatch").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceMatch").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

/// Downloads `url` to `dest` through a `.part` file, so an interrupted
/// download never leaves a truncated model behind.
fn download(
    url: &str,
    name: &str,
    dest: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let part = dest.with_extension("part");
    let result = fetch_to(url, name, &part, progress).and_then(|()| {
        fs::rename(&part, dest).map_err(|e| write_error(dest, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn fetch_to(
    url: &str,
    name: &str,
    path: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let file = fs::File::create(path).map_err(|e| write_error(path, e))?;
    let mut sink = ProgressWriter {
        inner: io::BufWriter::with_capacity(1 << 20, file),
        name,
        written: 0,
        total: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut sink).map_err(|e| write_error(path, e))?;
    sink.flush().map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, source: io::Error) -> ModelResolveError {
    ModelResolveError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Forwards writes to `inner`, reporting the running byte count.
struct ProgressWriter<'a, W: Write> {
    inner: W,
    name: &'a str,
    written: u64,
    total: u64,
    progress: Option<&'a ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = self.progress {
            cb(self.name, self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
