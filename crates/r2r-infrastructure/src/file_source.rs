//! Turns paths typed or pasted into the terminal into [`FileOffer`]s.
//!
//! The declared media type comes from the file extension, the same way a
//! browser file input reports `File.type`. Content is never sniffed.

use std::path::{Path, PathBuf};

use r2r_core::error::{R2rError, Result};
use r2r_core::intake::FileOffer;
use url::Url;

/// Media type declared for files whose extension is unknown.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Builds an offer for a file on disk.
///
/// Fails with an IO error when the path does not exist or is not a regular
/// file. The file is not read here.
pub async fn offer_from_path(path: impl AsRef<Path>) -> Result<FileOffer> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| R2rError::io(format!("Cannot open {}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(R2rError::io(format!("{} is not a file", path.display())));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = declared_media_type(path);
    tracing::debug!(path = %path.display(), %media_type, "File offered");

    Ok(FileOffer::from_path(name, media_type, path))
}

/// Media type guessed from the extension only.
pub fn declared_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
        .to_string()
}

/// Normalizes a path pasted or dropped onto a terminal prompt.
///
/// Terminals paste dragged files in different shapes: wrapped in quotes,
/// with backslash-escaped spaces, or as a `file://` URI. Returns `None` when
/// the input does not look like a path at all, or is a URI naming another
/// host.
pub fn normalize_dropped_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unquoted = strip_quotes(trimmed);
    let path = if unquoted.starts_with("file://") {
        Url::parse(unquoted).ok()?.to_file_path().ok()?
    } else if unquoted.len() != trimmed.len() {
        expand_home(unquoted)
    } else {
        expand_home(&unescape_backslashes(unquoted))
    };

    looks_like_path(&path).then_some(path)
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn unescape_backslashes(text: &str) -> String {
    // Windows paths keep their separators
    if text.len() > 2 && text.as_bytes()[1] == b':' {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn expand_home(text: &str) -> PathBuf {
    if let Some(rest) = text.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(text)
}

fn looks_like_path(path: &Path) -> bool {
    path.is_absolute()
        || path.starts_with(".")
        || path.starts_with("..")
        || path.components().count() > 1
        || path.extension().is_some()
}
