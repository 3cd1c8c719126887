//! 上传的影像文件

use std::path::Path;

use tracing::debug;

use crate::error::{Result, ScanError};

/// 用户选择的影像文件
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ScanFile {
    /// 创建影像文件，仅接受 `image/*` 类型
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(ScanError::UnsupportedMedia(mime_type));
        }

        Ok(Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        })
    }

    /// 从磁盘完整读取文件，按扩展名推断MIME类型
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ScanError::Read(format!("{}: {}", path.display(), e)))?;

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(file = %file_name, mime = mime_type, size = bytes.len(), "Loaded scan file");

        Self::new(file_name, mime_type, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_image() {
        let err = ScanFile::new("notes.pdf", "application/pdf", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedMedia(_)));
    }

    #[test]
    fn test_accepts_image() {
        let scan = ScanFile::new("chest.png", "image/png", vec![0x89, b'P', b'N', b'G']).unwrap();
        assert_eq!(scan.len(), 4);
        assert_eq!(scan.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime() {
        let dir = std::env::temp_dir().join(format!("medscan-scan-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("xray.jpg");
        tokio::fs::write(&path, [0xFF, 0xD8, 0xFF]).await.unwrap();

        let scan = ScanFile::from_path(&path).await.unwrap();
        assert_eq!(scan.mime_type, "image/jpeg");
        assert_eq!(scan.file_name, "xray.jpg");
        assert_eq!(scan.bytes, vec![0xFF, 0xD8, 0xFF]);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let err = ScanFile::from_path("/nonexistent/medscan/scan.png").await.unwrap_err();
        assert!(matches!(err, ScanError::Read(_)));
    }
}
