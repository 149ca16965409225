//! Pending outgoing text and the single staged attachment.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Declared media types the backend accepts as attachments.
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["application/pdf", "image/png", "image/jpeg"];

/// Hint shown next to the attach prompt. Informational only.
pub const PICKER_HINT: &str = ".pdf, image/*";

pub const UNSUPPORTED_FILE_TEXT: &str = "Only PDF or image files allowed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("unsupported attachment type: {media_type}")]
    UnsupportedType { media_type: String },
}

/// A file chosen by the user, with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk. The media type is declared from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, declared_media_type(path), bytes))
    }

    pub fn is_accepted_type(&self) -> bool {
        ACCEPTED_MEDIA_TYPES.contains(&self.media_type.as_str())
    }
}

/// Media type for a path, derived from its extension only.
pub fn declared_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Snapshot of the composer taken at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub text: String,
    pub file: Option<Attachment>,
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    text: String,
    file: Option<Attachment>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file(&self) -> Option<&Attachment> {
        self.file.as_ref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Stage a file, replacing any staged one. Unsupported types leave the
    /// current attachment untouched.
    pub fn attach_file(&mut self, candidate: Attachment) -> Result<(), AttachError> {
        if !candidate.is_accepted_type() {
            return Err(AttachError::UnsupportedType {
                media_type: candidate.media_type,
            });
        }
        self.file = Some(candidate);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.file = None;
    }

    /// Whether a send would be accepted (ignoring the loading flag).
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.file.is_some()
    }

    /// Move the pending text and file out, leaving the composer empty.
    pub fn take(&mut self) -> SendRequest {
        SendRequest {
            text: std::mem::take(&mut self.text),
            file: self.file.take(),
        }
    }
}
