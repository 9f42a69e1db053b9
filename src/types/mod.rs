//! Shared types for the WhatsApp client.

use bytes::Bytes;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// A decoded API response body.
///
/// Responses are parsed as JSON; anything that is not valid JSON is kept as
/// raw text so diagnostics never lose the body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON document.
    Json(Value),
    /// Raw text for bodies that are not valid JSON.
    Text(String),
}

impl ResponseBody {
    /// Decodes a body, falling back to raw text when JSON parsing fails.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// Returns the parsed JSON document, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Consumes the body, returning the parsed JSON document, if any.
    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Text(text) => f.write_str(text),
        }
    }
}

/// A file attachment for media upload.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Filename reported to the API.
    pub filename: String,
    /// File content.
    pub content: Bytes,
    /// Declared MIME type.
    pub mime_type: String,
}

impl MediaUpload {
    /// Creates an upload from in-memory content, guessing the MIME type from
    /// the filename extension.
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();

        Self {
            filename,
            content: content.into(),
            mime_type,
        }
    }

    /// Reads a local file in binary mode and uses its name as the filename.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, content))
    }

    /// Overrides the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}
