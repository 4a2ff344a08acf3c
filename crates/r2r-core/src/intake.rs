//! Intake domain: files offered by the user and the one file being held.
//!
//! A [`FileOffer`] is whatever an entry point (browse or drop) hands over.
//! Only offers whose declared media type is exactly [`PDF_MEDIA_TYPE`] become
//! a [`CandidateFile`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The only media type the pipeline accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// How a file offer reached the intake controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSource {
    /// Chosen through the file picker (`/open` in the terminal).
    Browse,
    /// Dropped onto the upload area (a path pasted onto the prompt).
    Drop,
}

/// Where the bytes of a file live. Bytes are read only when the file is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileHandle {
    /// A file on disk.
    Path(PathBuf),
    /// Bytes already in memory.
    Memory(Arc<[u8]>),
}

/// A file offered by one of the entry points, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOffer {
    /// Display name (file name without directories).
    pub name: String,
    /// Declared media type, e.g. `application/pdf`.
    pub media_type: String,
    /// Handle to the content.
    pub handle: FileHandle,
}

impl FileOffer {
    /// Creates an offer for a file on disk.
    pub fn from_path(
        name: impl Into<String>,
        media_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            handle: FileHandle::Path(path.into()),
        }
    }

    /// Creates an offer for in-memory content.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            handle: FileHandle::Memory(bytes.into()),
        }
    }

    /// Whether the declared media type is exactly the PDF type.
    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }
}

/// The validated file held by the intake controller.
///
/// Can only be built from an offer whose media type is `application/pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    name: String,
    handle: FileHandle,
}

impl CandidateFile {
    /// Validates an offer. Returns the offer back when it is not a PDF.
    pub fn try_from_offer(offer: FileOffer) -> Result<Self, FileOffer> {
        if !offer.is_pdf() {
            return Err(offer);
        }
        Ok(Self {
            name: offer.name,
            handle: offer.handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        PDF_MEDIA_TYPE
    }

    pub fn handle(&self) -> &FileHandle {
        &self.handle
    }

    /// Path on disk, when the file is backed by one.
    pub fn path(&self) -> Option<&Path> {
        match &self.handle {
            FileHandle::Path(path) => Some(path),
            FileHandle::Memory(_) => None,
        }
    }
}

/// Value of the underlying file picker.
///
/// Mirrors the held file when it was chosen by browsing and is cleared with
/// it, so the same path can be picked again after a removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePicker {
    value: Option<String>,
}

impl FilePicker {
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub(crate) fn set(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub(crate) fn reset(&mut self) {
        self.value = None;
    }
}
