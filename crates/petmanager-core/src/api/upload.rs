use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::ApiError;
use crate::http::{MultipartFile, UploadProgress};

/// Largest photo accepted for upload (5 MiB)
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field the API expects the photo under
pub const PHOTO_FIELD: &str = "foto";

/// A validated image ready to be uploaded.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    file_name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl PhotoUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self, ApiError> {
        let content_type = content_type.into();
        let bytes = bytes.into();

        if !content_type.starts_with("image/") {
            return Err(ApiError::InvalidPhoto(
                "Por favor, selecione uma imagem válida".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(ApiError::InvalidPhoto("O arquivo da foto está vazio".to_string()));
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(ApiError::InvalidPhoto(
                "A foto deve ter no máximo 5MB".to_string(),
            ));
        }

        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    /// Read a photo from disk, inferring its content type from the extension.
    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let content_type = content_type_for(path).ok_or_else(|| {
            ApiError::InvalidPhoto("Por favor, selecione uma imagem válida".to_string())
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            ApiError::InvalidPhoto(format!("Erro ao ler {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "foto".to_string());
        Self::new(file_name, content_type, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_multipart(self, progress: Option<UnboundedSender<UploadProgress>>) -> MultipartFile {
        MultipartFile {
            field: PHOTO_FIELD.to_string(),
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
            progress,
        }
    }
}

/// Image content type for a file extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_image() {
        let photo = PhotoUpload::new("rex.png", "image/png", vec![1u8; 128]).unwrap();
        assert_eq!(photo.len(), 128);
        assert_eq!(photo.content_type(), "image/png");

        let file = photo.into_multipart(None);
        assert_eq!(file.field, "foto");
        assert_eq!(file.file_name, "rex.png");
    }

    #[test]
    fn test_rejects_non_image() {
        let err = PhotoUpload::new("notes.pdf", "application/pdf", vec![1u8; 16]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidPhoto(_)));
        assert_eq!(err.user_message(), "Por favor, selecione uma imagem válida");
    }

    #[test]
    fn test_rejects_oversized_photo() {
        let err = PhotoUpload::new("big.jpg", "image/jpeg", vec![0u8; MAX_PHOTO_BYTES + 1]).unwrap_err();
        assert_eq!(err.user_message(), "A foto deve ter no máximo 5MB");

        // Exactly at the limit is fine
        assert!(PhotoUpload::new("ok.jpg", "image/jpeg", vec![0u8; MAX_PHOTO_BYTES]).is_ok());
    }

    #[test]
    fn test_rejects_empty_photo() {
        assert!(PhotoUpload::new("empty.png", "image/png", Vec::<u8>::new()).is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/rex.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("mia.png")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("notes.txt")), None);
        assert_eq!(content_type_for(Path::new("noext")), None);
    }
}
