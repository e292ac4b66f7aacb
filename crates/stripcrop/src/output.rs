//! Input validation and output naming.
//!
//! The pipeline itself never touches the filesystem; everything about
//! which files are accepted and where results land lives here.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use stripcrop_pipeline::OutputFormat;

/// Largest accepted input file (10 MiB).
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Accepted input extensions, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];

/// Timestamp layout used in generated file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Problems with the input or output paths, reported before the pipeline
/// runs.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The file extension is not an accepted image type.
    #[error("unsupported file type {extension:?}; allowed: jpg, jpeg, png, webp, bmp")]
    UnsupportedExtension {
        /// Extension as given (empty when the path has none).
        extension: String,
    },

    /// The file exceeds [`MAX_INPUT_BYTES`].
    #[error("file is {size} bytes; the maximum is {max} bytes")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Limit in bytes.
        max: u64,
    },

    /// Reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Reject paths whose extension is not an accepted image type.
///
/// # Errors
///
/// Returns [`InputError::UnsupportedExtension`].
pub fn check_extension(path: &Path) -> Result<(), InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    {
        Ok(())
    } else {
        Err(InputError::UnsupportedExtension {
            extension: extension.to_string(),
        })
    }
}

/// Validate and read an input image file.
///
/// # Errors
///
/// Returns [`InputError::UnsupportedExtension`], [`InputError::TooLarge`],
/// or [`InputError::Io`] if the file cannot be read.
pub fn read_input(path: &Path) -> Result<Vec<u8>, InputError> {
    check_extension(path)?;
    let io_err = |source| InputError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = fs::metadata(path).map_err(io_err)?.len();
    if size > MAX_INPUT_BYTES {
        return Err(InputError::TooLarge {
            size,
            max: MAX_INPUT_BYTES,
        });
    }
    fs::read(path).map_err(io_err)
}

/// Write encoded bytes, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`InputError::Io`] on any filesystem failure.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), InputError> {
    let io_err = |source| InputError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}

/// Keep only ASCII alphanumerics, `-` and `_`. Returns `None` when
/// nothing usable remains.
#[must_use]
pub fn sanitize_name(name: &str) -> Option<String> {
    let clean: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!clean.is_empty()).then_some(clean)
}

/// `{stem}_cropped_{YYYYmmdd_HHMMSS}.{ext}`, timestamp in UTC.
#[must_use]
pub fn generated_file_name(stem: &str, now: DateTime<Utc>, format: OutputFormat) -> String {
    format!(
        "{stem}_cropped_{}.{}",
        now.format(TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Where the cropped image goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// An explicit file path.
    File(PathBuf),
    /// A directory; the name is generated.
    Directory {
        /// Target directory.
        dir: PathBuf,
        /// Explicit base name (already sanitized), replacing the
        /// timestamped name.
        name: Option<String>,
    },
}

impl Destination {
    /// Pick the output format: an explicit choice wins, then the
    /// extension of an explicit file path, then PNG.
    #[must_use]
    pub fn format(&self, requested: Option<OutputFormat>) -> OutputFormat {
        if let Some(format) = requested {
            return format;
        }
        match self {
            Self::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(OutputFormat::from_extension)
                .unwrap_or_default(),
            Self::Directory { .. } => OutputFormat::Png,
        }
    }

    /// Resolve the final output path for `input`.
    #[must_use]
    pub fn resolve(&self, input: &Path, format: OutputFormat, now: DateTime<Utc>) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Directory { dir, name } => {
                let file_name = match name {
                    Some(name) => format!("{name}.{}", format.extension()),
                    None => {
                        let stem = input
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .and_then(sanitize_name)
                            .unwrap_or_else(|| "image".to_string());
                        generated_file_name(&stem, now, format)
                    }
                };
                dir.join(file_name)
            }
        }
    }
}
