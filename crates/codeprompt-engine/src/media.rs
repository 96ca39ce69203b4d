use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Upper bound for a video handed to the remix template.
pub const MAX_REMIX_VIDEO_BYTES: u64 = 30 * 1024 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";

/// An uploaded file held in memory until it is attached to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = detect_mime(path, &bytes);
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn base64_data(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

fn detect_mime(path: &Path, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use image::{Rgb, RgbImage};

    use super::MediaFile;

    #[test]
    fn sniffs_image_bytes_before_extension() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("upload.bin");
        RgbImage::from_pixel(2, 2, Rgb([200, 10, 10])).save_with_format(&path, image::ImageFormat::Png)?;

        let media = MediaFile::from_path(&path)?;
        assert_eq!(media.name, "upload.bin");
        assert_eq!(media.mime_type, "image/png");
        assert!(media.is_image());
        assert!(!media.is_video());
        Ok(())
    }

    #[test]
    fn falls_back_to_extension_for_video() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("clip.mp4");
        fs::write(&path, b"not really mp4")?;

        let media = MediaFile::from_path(&path)?;
        assert_eq!(media.mime_type, "video/mp4");
        assert!(media.is_video());
        assert_eq!(media.size(), 14);
        Ok(())
    }

    #[test]
    fn base64_payload_matches_bytes() {
        let media = MediaFile::new("a.txt", "text/plain", b"hi".to_vec());
        assert_eq!(media.base64_data(), "aGk=");
    }

    #[test]
    fn missing_file_carries_path() {
        let err = MediaFile::from_path(std::path::Path::new("/definitely/missing.png"))
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("/definitely/missing.png"));
    }
}
