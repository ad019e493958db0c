//! Local image files picked for upload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

/// Content type used when none is known.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file the user picked, fully read into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    /// File name (no directories)
    pub name: String,
    /// Declared content type
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Build from in-memory parts
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Read a file from disk, guessing the content type from its extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let content_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => Some("image/jpeg"),
            Some("png") => Some("image/png"),
            Some("gif") => Some("image/gif"),
            Some("webp") => Some("image/webp"),
            Some("bmp") => Some("image/bmp"),
            _ => None,
        };

        Ok(Self::new(name, content_type.map(str::to_string), bytes))
    }

    /// Declared content type, or `application/octet-stream`
    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }

    /// Inline `data:<type>;base64,<...>` reference to the contents
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type_or_default(),
            STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let file = LocalFile::new("a.png", Some("image/png".into()), vec![0, 1, 2]);
        assert_eq!(file.to_data_url(), "data:image/png;base64,AAEC");

        let file = LocalFile::new("blob", None, b"hi".to_vec());
        assert_eq!(file.to_data_url(), "data:application/octet-stream;base64,aGk=");
    }

    #[tokio::test]
    async fn test_from_path_guesses_type() {
        let path = std::env::temp_dir().join("artisan-studio-upload-test.JPG");
        tokio::fs::write(&path, b"jpeg").await.unwrap();

        let file = LocalFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "artisan-studio-upload-test.JPG");
        assert_eq!(file.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(file.bytes, b"jpeg");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
